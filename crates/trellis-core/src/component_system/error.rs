// crates/trellis-core/src/component_system/error.rs
//! # Trellis Component System Errors
//!
//! [`ComponentSystemError`] covers host misuse of a loader session and
//! failures of discovery adapters. [`BackendError`] is what a module backend
//! reports when it cannot physically load a module; the orchestrator turns it
//! into an `UnableToLoad` flag rather than propagating it.
use std::path::PathBuf;

use crate::component_system::version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum ComponentSystemError {
    #[error("No components were added before load_components was called")]
    NoDiscoveryScope,

    #[error("load_components has already run for this session")]
    AlreadyLoaded,

    #[error("Components cannot be added after load_components has run")]
    SessionSealed,

    #[error("Discovery failed for scope '{scope}': {message}")]
    Discovery {
        scope: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Component manifest error for '{path}': {message}")]
    Manifest {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Version error: {0}")]
    Version(#[from] VersionError),
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to load library '{path}': {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("No builtin module registered under '{0}'")]
    UnknownModule(String),

    #[error("Backend '{backend}' cannot load from {location}")]
    UnsupportedLocation {
        backend: &'static str,
        location: String,
    },

    #[error("Module factory for '{key}' failed: {message}")]
    Factory {
        key: String,
        message: String,
    },
}
