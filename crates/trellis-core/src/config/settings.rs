use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::kernel::constants::{MANIFEST_FILE_NAME, RUNTIME_VERSION};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Build profile a component was compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    /// Profile of the running host binary
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildProfile::Debug
        } else {
            BuildProfile::Release
        }
    }
}

/// What the library backend does with a shared library once its component
/// has been finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnloadPolicy {
    /// Keep the library mapped for the rest of the process. Code and statics
    /// a component handed out stay valid.
    #[default]
    Leak,
    /// Close the library handle.
    Release,
}

/// Settings for a loader session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Directories scanned for component manifests
    pub component_dirs: Vec<PathBuf>,
    /// File name of the manifest inside each component directory
    pub manifest_file_name: String,
    /// Identifiers (`name.vendor`, lower-cased) the user disabled
    pub disabled_components: BTreeSet<String>,
    /// Runtime version advertised by the host
    pub runtime_version: String,
    /// When set, components declaring another profile are ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_profile: Option<BuildProfile>,
    pub unload_policy: UnloadPolicy,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            component_dirs: Vec::new(),
            manifest_file_name: MANIFEST_FILE_NAME.to_string(),
            disabled_components: BTreeSet::new(),
            runtime_version: RUNTIME_VERSION.to_string(),
            build_profile: None,
            unload_policy: UnloadPolicy::default(),
        }
    }
}

impl LoaderSettings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = Self::format_for(path)?;
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|e| ConfigError::io(path, "read", e))?;
        Self::from_str(&data, format)
    }

    /// Write settings to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let format = Self::format_for(path)?;
        let data = self.to_string(format)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::io(parent, "create_dir_all", e))?;
            }
        }
        fs::write(path, data).map_err(|e| ConfigError::io(path, "write", e))?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Deserialize from string based on format
    pub fn from_str(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let deserialization_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::DeserializationError {
                format: format.extension().to_string(),
                source,
            }
        };
        match format {
            ConfigFormat::Json => {
                serde_json::from_str(data).map_err(|e| deserialization_error(Box::new(e)))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(data).map_err(|e| deserialization_error(Box::new(e)))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::from_str(data).map_err(|e| deserialization_error(Box::new(e)))
            }
        }
    }

    /// Serialize to string based on format
    pub fn to_string(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let serialization_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::SerializationError {
                format: format.extension().to_string(),
                source,
            }
        };
        match format {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| serialization_error(Box::new(e)))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::to_string(self).map_err(|e| serialization_error(Box::new(e)))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| serialization_error(Box::new(e)))
            }
        }
    }

    /// Mark a component identifier as disabled. Returns false if it already was.
    pub fn disable(&mut self, identifier: &str) -> bool {
        self.disabled_components.insert(identifier.to_lowercase())
    }

    /// Remove a component identifier from the disabled list. Returns false if
    /// it was not disabled.
    pub fn enable(&mut self, identifier: &str) -> bool {
        self.disabled_components.remove(&identifier.to_lowercase())
    }

    fn format_for(path: &Path) -> Result<ConfigFormat, ConfigError> {
        ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedConfigFormat(path.display().to_string()))
    }
}
