use std::fmt;

use semver::Version;
use serde::Serialize;

use crate::component_system::manifest::{ComponentDetails, SourceLocation};
use crate::component_system::status::{LoadFlag, LoadStatus};
use crate::component_system::version::RuntimeVersion;

/// Index of a record within its loader session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A dependency edge after linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub id: ComponentId,
    pub name: String,
    pub min_version: Version,
}

/// One discovered component and everything the loader learned about it.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentRecord {
    id: ComponentId,
    name: String,
    identifier: String,
    source: SourceLocation,
    version: Version,
    runtime_version: RuntimeVersion,
    raw_dependencies: Vec<(String, Version)>,
    resolved_dependencies: Vec<ResolvedDependency>,
    status: LoadStatus,
    missing_dependencies: Vec<String>,
    loaded: bool,
    can_be_disabled: bool,
    details: ComponentDetails,
}

impl ComponentRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ComponentId,
        name: String,
        source: SourceLocation,
        version: Version,
        runtime_version: RuntimeVersion,
        raw_dependencies: Vec<(String, Version)>,
        can_be_disabled: bool,
        details: ComponentDetails,
    ) -> Self {
        let identifier = make_identifier(&name, &details.vendor);
        Self {
            id,
            name,
            identifier,
            source,
            version,
            runtime_version,
            raw_dependencies,
            resolved_dependencies: Vec::new(),
            status: LoadStatus::new(),
            missing_dependencies: Vec::new(),
            loaded: false,
            can_be_disabled,
            details,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable external reference, `name.vendor` lower-cased
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn runtime_version(&self) -> &RuntimeVersion {
        &self.runtime_version
    }

    pub fn raw_dependencies(&self) -> &[(String, Version)] {
        &self.raw_dependencies
    }

    pub fn resolved_dependencies(&self) -> &[ResolvedDependency] {
        &self.resolved_dependencies
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn missing_dependencies(&self) -> &[String] {
        &self.missing_dependencies
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn can_be_disabled(&self) -> bool {
        self.can_be_disabled
    }

    pub fn details(&self) -> &ComponentDetails {
        &self.details
    }

    /// Version with branch and revision, e.g. `1.2.0-main (abc123)`.
    pub fn version_string(&self) -> String {
        let mut text = self.version.to_string();
        if !self.details.branch.is_empty() {
            text.push('-');
            text.push_str(&self.details.branch);
        }
        if !self.details.revision.is_empty() {
            text.push_str(&format!(" ({})", self.details.revision));
        }
        text
    }

    /// One `Name (min)` line per declared dependency.
    pub fn dependency_summary(&self) -> String {
        self.raw_dependencies
            .iter()
            .map(|(name, min)| format!("{} ({})", name, min))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Adds a resolved edge. A repeated dependency keeps one edge with the
    /// higher minimum.
    pub(crate) fn add_dependency(&mut self, id: ComponentId, name: &str, min_version: Version) {
        if let Some(existing) = self.resolved_dependencies.iter_mut().find(|d| d.id == id) {
            if min_version > existing.min_version {
                existing.min_version = min_version;
            }
            return;
        }
        self.resolved_dependencies.push(ResolvedDependency {
            id,
            name: name.to_string(),
            min_version,
        });
    }

    pub(crate) fn flag(&mut self, flag: LoadFlag) {
        self.status.insert(flag);
    }

    pub(crate) fn mark_missing(&mut self, name: &str) {
        if !self.missing_dependencies.iter().any(|n| n == name) {
            self.missing_dependencies.push(name.to_string());
        }
        self.status.insert(LoadFlag::MissingDependency);
    }

    /// Only valid while no failure flag is set.
    pub(crate) fn mark_loaded(&mut self) {
        debug_assert!(!self.status.has_failure());
        self.status.insert(LoadFlag::Loaded);
        self.loaded = true;
    }
}

pub(crate) fn make_identifier(name: &str, vendor: &str) -> String {
    format!("{}.{}", name, vendor).to_lowercase()
}
