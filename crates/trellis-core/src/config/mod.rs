//! # Trellis Configuration
//!
//! Host-side settings for a component loader session: where to look for
//! components, which ones the user disabled, the runtime version and build
//! profile the host advertises, and what happens to shared libraries on
//! unload.
//!
//! Settings are persisted as JSON, YAML (`yaml-config` feature) or TOML
//! (`toml-config` feature); the format follows the file extension.
pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{BuildProfile, ConfigFormat, LoaderSettings, UnloadPolicy};
