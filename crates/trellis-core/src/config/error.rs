//! # Trellis Configuration Errors
//!
//! [`ConfigError`] covers reading, writing and (de)serializing the loader
//! settings file.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization to '{format}' failed: {source}")]
    SerializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    DeserializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedConfigFormat(String),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, operation: &str, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            operation: operation.to_string(),
            source,
        }
    }
}
