use std::collections::BTreeSet;

use log::warn;

use crate::component_system::record::ComponentRecord;
use crate::config::LoaderSettings;

/// Selection policy that loads everything.
pub fn allow_all(_record: &ComponentRecord) -> bool {
    true
}

/// Selection policy built from a list of disabled component identifiers.
///
/// Components that cannot be disabled are loaded even when listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledComponents {
    identifiers: BTreeSet<String>,
}

impl DisabledComponents {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identifiers: identifiers
                .into_iter()
                .map(|id| id.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_settings(settings: &LoaderSettings) -> Self {
        Self::new(&settings.disabled_components)
    }

    pub fn is_listed(&self, identifier: &str) -> bool {
        self.identifiers.contains(&identifier.to_lowercase())
    }

    /// Decide whether `record` may be loaded.
    pub fn allows(&self, record: &ComponentRecord) -> bool {
        if !self.identifiers.contains(record.identifier()) {
            return true;
        }
        if !record.can_be_disabled() {
            warn!(
                "Component '{}' is listed as disabled but cannot be disabled; loading it anyway",
                record.identifier()
            );
            return true;
        }
        false
    }

    /// Turn into a closure accepted by `ComponentLoader::load_components`
    pub fn into_policy(self) -> impl FnMut(&ComponentRecord) -> bool {
        move |record| self.allows(record)
    }
}
