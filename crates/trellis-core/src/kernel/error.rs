//! # Trellis Core Kernel Errors
//!
//! Defines the crate-level [`Error`] that wraps the typed errors of each
//! subsystem. Per-component load failures are never errors; they are
//! recorded as flags on the component's record instead.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::component_system::error::ComponentSystemError;
use crate::component_system::version::VersionError;
use crate::config::error::ConfigError;

/// Crate-wide error type
#[derive(Debug, ThisError)]
pub enum Error {
    /// Host misuse or discovery failure in the component system
    #[error("Component system error: {0}")]
    ComponentSystem(#[from] ComponentSystemError),

    /// Host configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<VersionError> for Error {
    fn from(err: VersionError) -> Self {
        Error::ComponentSystem(ComponentSystemError::Version(err))
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
