//! Load status of a component.
//!
//! A [`LoadStatus`] is a set of [`LoadFlag`]s. Flags are only ever added
//! during a session, so a status can carry several failure causes at once
//! (for example a missing dependency and an incompatible runtime).
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// One independent outcome of discovering or loading a component.
///
/// The declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LoadFlag {
    /// Terminal success flag
    Loaded,
    /// Built against a runtime with a different major version
    IncompatibleRuntimeVersion,
    /// Another component with the same name was registered first
    NameClash,
    /// A dependency is unknown or did not load
    MissingDependency,
    /// Rejected by the host's selection policy
    Disabled,
    /// A loaded dependency is older than the required minimum
    IncompatibleVersion,
    /// The backend could not load the module
    UnableToLoad,
    /// The module does not expose the lifecycle capability
    MissingInterface,
}

impl LoadFlag {
    /// All flags in display order
    pub const ALL: [LoadFlag; 8] = [
        LoadFlag::Loaded,
        LoadFlag::IncompatibleRuntimeVersion,
        LoadFlag::NameClash,
        LoadFlag::MissingDependency,
        LoadFlag::Disabled,
        LoadFlag::IncompatibleVersion,
        LoadFlag::UnableToLoad,
        LoadFlag::MissingInterface,
    ];

    /// Name of the flag as shown to users
    pub fn name(&self) -> &'static str {
        match self {
            LoadFlag::Loaded => "Loaded",
            LoadFlag::IncompatibleRuntimeVersion => "IncompatibleRuntimeVersion",
            LoadFlag::NameClash => "NameClash",
            LoadFlag::MissingDependency => "MissingDependency",
            LoadFlag::Disabled => "Disabled",
            LoadFlag::IncompatibleVersion => "IncompatibleVersion",
            LoadFlag::UnableToLoad => "UnableToLoad",
            LoadFlag::MissingInterface => "MissingInterface",
        }
    }

    /// Whether this flag prevents the component from loading
    pub fn is_failure(&self) -> bool {
        !matches!(self, LoadFlag::Loaded)
    }
}

impl fmt::Display for LoadFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Append-only set of load flags. Empty means the component has not been
/// attempted yet ("Unloaded").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LoadStatus {
    flags: BTreeSet<LoadFlag>,
}

impl LoadStatus {
    /// Create an empty (unloaded) status
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag. Flags are never removed.
    pub fn insert(&mut self, flag: LoadFlag) {
        self.flags.insert(flag);
    }

    /// Check whether a flag is set
    pub fn contains(&self, flag: LoadFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// No flag set yet
    pub fn is_unloaded(&self) -> bool {
        self.flags.is_empty()
    }

    /// Any flag at all is set; the orchestrator refuses to load such a component
    pub fn is_set(&self) -> bool {
        !self.flags.is_empty()
    }

    /// At least one failure flag is set
    pub fn has_failure(&self) -> bool {
        self.flags.iter().any(LoadFlag::is_failure)
    }

    /// The component loaded successfully
    pub fn is_loaded(&self) -> bool {
        self.contains(LoadFlag::Loaded)
    }

    /// Iterate the set flags in display order
    pub fn iter(&self) -> impl Iterator<Item = LoadFlag> + '_ {
        self.flags.iter().copied()
    }

    /// Only the failure flags, in display order
    pub fn failures(&self) -> Vec<LoadFlag> {
        self.flags.iter().copied().filter(LoadFlag::is_failure).collect()
    }

    /// Number of flags set
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<LoadFlag> for LoadStatus {
    fn from_iter<I: IntoIterator<Item = LoadFlag>>(iter: I) -> Self {
        Self { flags: iter.into_iter().collect() }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.is_empty() {
            return f.write_str("Unloaded");
        }
        let names: Vec<&str> = self.flags.iter().map(LoadFlag::name).collect();
        f.write_str(&names.join(" | "))
    }
}
