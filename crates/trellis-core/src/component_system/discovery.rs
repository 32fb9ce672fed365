use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::fs;

use crate::component_system::error::ComponentSystemError;
use crate::component_system::manifest::{ComponentDescriptor, RawComponentManifest};
use crate::kernel::constants::MANIFEST_FILE_NAME;
use crate::kernel::error::Result;

/// Source of candidate components.
#[async_trait]
pub trait DiscoveryAdapter: Send + Sync {
    /// Human-readable description of where this adapter looks
    fn scope(&self) -> String;

    /// Produce the descriptors of every candidate in scope.
    async fn discover(&self) -> Result<Vec<ComponentDescriptor>>;
}

/// Discovers components from manifests in the immediate subdirectories of
/// one directory.
///
/// ```text
/// components/
///   greeter/
///     component.json
///     libgreeter.so
/// ```
#[derive(Debug, Clone)]
pub struct ManifestDirectory {
    dir: PathBuf,
    manifest_file_name: String,
}

impl ManifestDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            manifest_file_name: MANIFEST_FILE_NAME.to_string(),
        }
    }

    /// Use a manifest file name other than `component.json`
    pub fn with_manifest_file_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_file_name = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load_manifest(&self, component_dir: &Path, manifest_path: &Path) -> Result<ComponentDescriptor> {
        let content = fs::read_to_string(manifest_path)
            .await
            .map_err(|e| ComponentSystemError::Manifest {
                path: manifest_path.to_path_buf(),
                message: "failed to read manifest".to_string(),
                source: Some(Box::new(e)),
            })?;
        let raw = RawComponentManifest::parse(&content, manifest_path)?;
        Ok(raw.into_descriptor(component_dir, manifest_path)?)
    }
}

#[async_trait]
impl DiscoveryAdapter for ManifestDirectory {
    fn scope(&self) -> String {
        self.dir.display().to_string()
    }

    async fn discover(&self) -> Result<Vec<ComponentDescriptor>> {
        let dir_exists = fs::try_exists(&self.dir).await.unwrap_or(false);
        if !dir_exists {
            debug!("Component directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let discovery_error = |message: &str, e: std::io::Error| ComponentSystemError::Discovery {
            scope: self.scope(),
            message: message.to_string(),
            source: Some(Box::new(e)),
        };

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| discovery_error("failed to read directory", e))?;

        let mut component_dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| discovery_error("failed to read directory entry", e))?
        {
            let path = entry.path();
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => component_dirs.push(path),
                Ok(_) => {}
                Err(e) => warn!("Failed to get metadata for {}: {}", path.display(), e),
            }
        }
        component_dirs.sort();

        let mut descriptors = Vec::new();
        for component_dir in component_dirs {
            let manifest_path = component_dir.join(&self.manifest_file_name);
            let is_file = fs::metadata(&manifest_path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            match self.load_manifest(&component_dir, &manifest_path).await {
                Ok(descriptor) => {
                    debug!("Found component '{}' in {}", descriptor.name, component_dir.display());
                    descriptors.push(descriptor);
                }
                Err(e) => warn!("Skipping {}: {}", manifest_path.display(), e),
            }
        }

        Ok(descriptors)
    }
}

/// Discovery over a fixed, in-memory list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    scope: String,
    descriptors: Vec<ComponentDescriptor>,
}

impl StaticDiscovery {
    pub fn new(descriptors: Vec<ComponentDescriptor>) -> Self {
        Self {
            scope: "static".to_string(),
            descriptors,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn push(&mut self, descriptor: ComponentDescriptor) {
        self.descriptors.push(descriptor);
    }
}

impl FromIterator<ComponentDescriptor> for StaticDiscovery {
    fn from_iter<I: IntoIterator<Item = ComponentDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl DiscoveryAdapter for StaticDiscovery {
    fn scope(&self) -> String {
        self.scope.clone()
    }

    async fn discover(&self) -> Result<Vec<ComponentDescriptor>> {
        Ok(self.descriptors.clone())
    }
}
