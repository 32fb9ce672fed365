// crates/trellis-core/src/component_system/manifest.rs
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::component_system::error::ComponentSystemError;
use crate::config::BuildProfile;
use crate::kernel::constants::RUNTIME_VERSION;

/// Where a backend finds the code of a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SourceLocation {
    /// A shared library on disk
    Library(PathBuf),
    /// A module compiled into the host, looked up by key
    Builtin(String),
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Library(path) => write!(f, "library {}", path.display()),
            SourceLocation::Builtin(key) => write!(f, "builtin '{}'", key),
        }
    }
}

/// A dependency as declared by a component, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDependency {
    pub name: String,
    /// Minimum acceptable version; empty means any
    pub min_version: String,
}

impl RawDependency {
    pub fn new(name: impl Into<String>, min_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_version: min_version.into(),
        }
    }
}

/// Descriptive metadata the loader carries around but never interprets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDetails {
    pub vendor: String,
    pub category: String,
    pub license: String,
    pub copyright: String,
    pub description: String,
    pub url: String,
    pub branch: String,
    pub revision: String,
}

/// Everything a discovery adapter knows about one candidate component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    pub version: String,
    pub runtime_version: String,
    pub source: SourceLocation,
    pub dependencies: Vec<RawDependency>,
    pub can_be_disabled: bool,
    pub build_profile: Option<BuildProfile>,
    pub details: ComponentDetails,
}

impl ComponentDescriptor {
    /// Descriptor for a library component. The runtime version defaults to the
    /// host's.
    pub fn new(name: impl Into<String>, version: impl Into<String>, source: SourceLocation) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            runtime_version: RUNTIME_VERSION.to_string(),
            source,
            dependencies: Vec::new(),
            can_be_disabled: true,
            build_profile: None,
            details: ComponentDetails::default(),
        }
    }

    /// Descriptor for an in-process component keyed by its own name.
    pub fn builtin(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.clone();
        Self::new(name, version, SourceLocation::Builtin(key))
    }

    pub fn depends_on(mut self, name: impl Into<String>, min_version: impl Into<String>) -> Self {
        self.dependencies.push(RawDependency::new(name, min_version));
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.details.vendor = vendor.into();
        self
    }

    pub fn with_runtime_version(mut self, runtime_version: impl Into<String>) -> Self {
        self.runtime_version = runtime_version.into();
        self
    }

    pub fn with_build_profile(mut self, profile: BuildProfile) -> Self {
        self.build_profile = Some(profile);
        self
    }

    pub fn with_details(mut self, details: ComponentDetails) -> Self {
        self.details = details;
        self
    }

    pub fn not_disableable(mut self) -> Self {
        self.can_be_disabled = false;
        self
    }
}

/// A text field that manifests may give either as one string or as lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestText {
    Single(String),
    Lines(Vec<String>),
}

impl Default for ManifestText {
    fn default() -> Self {
        ManifestText::Single(String::new())
    }
}

impl ManifestText {
    fn join(self, separator: &str) -> String {
        match self {
            ManifestText::Single(text) => text,
            ManifestText::Lines(lines) => lines.join(separator),
        }
    }
}

/// Dependency entry of an on-disk manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDependency {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

fn default_can_be_disabled() -> bool {
    true
}

/// Raw structure for deserializing `component.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComponentManifest {
    pub name: String,
    pub version: String,
    pub runtime_version: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub license: ManifestText,
    #[serde(default)]
    pub copyright: String,
    #[serde(default)]
    pub description: ManifestText,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default = "default_can_be_disabled")]
    pub can_be_disabled: bool,
    #[serde(default)]
    pub build_profile: Option<BuildProfile>,
    /// Library file relative to the manifest's directory
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<ManifestDependency>,
}

impl RawComponentManifest {
    /// Parse a manifest from JSON text. `path` is only used for error messages.
    pub fn parse(data: &str, path: &Path) -> Result<Self, ComponentSystemError> {
        serde_json::from_str(data).map_err(|e| ComponentSystemError::Manifest {
            path: path.to_path_buf(),
            message: "invalid manifest JSON".to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// Turn the manifest into a descriptor whose library lives under `component_dir`.
    pub fn into_descriptor(
        self,
        component_dir: &Path,
        manifest_path: &Path,
    ) -> Result<ComponentDescriptor, ComponentSystemError> {
        if self.name.trim().is_empty() {
            return Err(ComponentSystemError::Manifest {
                path: manifest_path.to_path_buf(),
                message: "component name is empty".to_string(),
                source: None,
            });
        }

        let entry_point = match self.entry_point {
            Some(entry) => PathBuf::from(entry),
            None => PathBuf::from(libloading::library_filename(self.name.to_lowercase())),
        };
        validate_entry_point(&entry_point, manifest_path)?;

        let details = ComponentDetails {
            vendor: self.vendor,
            category: self.category,
            license: self.license.join(""),
            copyright: self.copyright,
            description: self.description.join("\n"),
            url: self.url,
            branch: self.branch,
            revision: self.revision,
        };

        Ok(ComponentDescriptor {
            name: self.name,
            version: self.version,
            runtime_version: self.runtime_version,
            source: SourceLocation::Library(component_dir.join(entry_point)),
            dependencies: self
                .dependencies
                .into_iter()
                .map(|dep| RawDependency::new(dep.name, dep.version))
                .collect(),
            can_be_disabled: self.can_be_disabled,
            build_profile: self.build_profile,
            details,
        })
    }
}

fn validate_entry_point(entry_point: &Path, manifest_path: &Path) -> Result<(), ComponentSystemError> {
    let escapes = entry_point.is_absolute()
        || entry_point
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes || entry_point.as_os_str().is_empty() {
        return Err(ComponentSystemError::Manifest {
            path: manifest_path.to_path_buf(),
            message: format!(
                "entry_point '{}' must be a relative path inside the component directory",
                entry_point.display()
            ),
            source: None,
        });
    }
    Ok(())
}
