//! # Dependency Resolution
//!
//! Links the declared dependencies of every record to other records of the
//! same session and computes one global load order in which each component
//! comes after the components it depends on.
//!
//! Cycles do not stop resolution. When the traversal reaches a component
//! that is still being visited, the edge is treated as satisfied and a
//! warning is logged. The order is then only best-effort for the members of
//! the cycle; the orchestrator's dependency validation keeps them from
//! loading.
use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};

use crate::component_system::record::{ComponentId, ComponentRecord};

/// Resolver over the records of one session.
///
/// `search` maps component names to records. It holds only the first record
/// registered under each name, so name-clashing records are invisible here.
pub struct DependencyResolver<'a> {
    records: &'a mut [ComponentRecord],
    search: &'a BTreeMap<String, ComponentId>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(records: &'a mut [ComponentRecord], search: &'a BTreeMap<String, ComponentId>) -> Self {
        Self { records, search }
    }

    /// Turns declared dependencies into edges. Unknown names become
    /// `MissingDependency`. Returns the records still free of flags, in name
    /// order.
    pub fn link(&mut self) -> Vec<ComponentId> {
        let mut candidates = Vec::new();

        for (name, &id) in self.search.iter() {
            let record = &mut self.records[id.index()];
            if record.status().is_set() {
                debug!("Not linking '{}', already flagged ({})", name, record.status());
                continue;
            }

            let declared = record.raw_dependencies().to_vec();
            for (dep_name, min_version) in declared {
                match self.search.get(&dep_name) {
                    Some(&dep_id) => record.add_dependency(dep_id, &dep_name, min_version),
                    None => {
                        warn!("Component '{}' depends on unknown component '{}'", name, dep_name);
                        record.mark_missing(&dep_name);
                    }
                }
            }

            if !record.status().is_set() {
                candidates.push(id);
            }
        }

        candidates
    }

    /// Links all records and returns the global load order.
    pub fn resolve(mut self) -> Vec<ComponentId> {
        let candidates = self.link();
        let candidate_set: HashSet<ComponentId> = candidates.iter().copied().collect();

        let mut order = Vec::with_capacity(candidates.len());
        let mut placed: HashSet<ComponentId> = HashSet::new();

        for root in candidates {
            if placed.contains(&root) {
                continue;
            }

            let mut local = Vec::new();
            let mut visiting = HashSet::new();
            visit(&*self.records, root, &candidate_set, &placed, &mut visiting, &mut local);

            for id in local {
                if placed.insert(id) {
                    order.push(id);
                }
            }
        }

        debug!(
            "Resolved load order: [{}]",
            order
                .iter()
                .map(|id| self.records[id.index()].name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        order
    }
}

/// Convenience wrapper around [`DependencyResolver::resolve`].
pub fn resolve(records: &mut [ComponentRecord], search: &BTreeMap<String, ComponentId>) -> Vec<ComponentId> {
    DependencyResolver::new(records, search).resolve()
}

// Post-order depth-first visit of `id` appending to `local`.
fn visit(
    records: &[ComponentRecord],
    id: ComponentId,
    candidates: &HashSet<ComponentId>,
    placed: &HashSet<ComponentId>,
    visiting: &mut HashSet<ComponentId>,
    local: &mut Vec<ComponentId>,
) {
    visiting.insert(id);

    for dep in records[id.index()].resolved_dependencies() {
        if !candidates.contains(&dep.id) || placed.contains(&dep.id) || local.contains(&dep.id) {
            continue;
        }
        if visiting.contains(&dep.id) {
            warn!(
                "Dependency cycle: '{}' depends on '{}' which is still being resolved; ordering is best-effort",
                records[id.index()].name(),
                dep.name
            );
            continue;
        }
        visit(records, dep.id, candidates, placed, visiting, local);
    }

    visiting.remove(&id);
    local.push(id);
}
