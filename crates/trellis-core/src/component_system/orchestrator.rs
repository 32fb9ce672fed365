//! # Lifecycle Orchestration
//!
//! Walks the resolved load order, loads every component that passes its
//! checks, and drives the lifecycle callbacks:
//!
//! 1. `initialize` on each loaded component in load order
//! 2. `initialization_finished` in reverse load order
//! 3. at teardown, `finalize` in reverse load order, after which the object
//!    registry is cleared and the modules are released (also in reverse)
//!
//! A failing component never aborts the run. Its reasons are recorded as
//! status flags and it is skipped.
use log::{debug, info, warn};

use crate::component_system::backend::ModuleBackend;
use crate::component_system::lifecycle::ComponentLifecycle;
use crate::component_system::record::{ComponentId, ComponentRecord};
use crate::component_system::registry::ObjectRegistry;
use crate::component_system::status::LoadFlag;

/// A component that made it through loading.
pub struct LoadedComponent<M> {
    pub id: ComponentId,
    pub name: String,
    lifecycle: Box<dyn ComponentLifecycle>,
    module: M,
}

impl<M> LoadedComponent<M> {
    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M> std::fmt::Debug for LoadedComponent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedComponent")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Drives one backend through the load, initialization and teardown phases.
pub struct LifecycleOrchestrator<'a, B: ModuleBackend> {
    backend: &'a mut B,
}

impl<'a, B: ModuleBackend> LifecycleOrchestrator<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    /// Load the records of `order` that pass their checks. Returns the loaded
    /// components in load order.
    pub fn run<P>(
        &mut self,
        records: &mut [ComponentRecord],
        order: &[ComponentId],
        mut policy: P,
    ) -> Vec<LoadedComponent<B::Module>>
    where
        P: FnMut(&ComponentRecord) -> bool,
    {
        let mut completed = Vec::new();

        for &id in order {
            if records[id.index()].status().is_set() {
                report_not_loaded(&records[id.index()]);
                continue;
            }

            if !validate_dependencies(records, id) {
                report_not_loaded(&records[id.index()]);
                continue;
            }

            let record = &mut records[id.index()];

            if !policy(&*record) {
                record.flag(LoadFlag::Disabled);
                report_not_loaded(record);
                continue;
            }

            let mut module = match self.backend.load(record.source()) {
                Ok(module) => module,
                Err(e) => {
                    warn!("Unable to load component '{}': {}", record.name(), e);
                    record.flag(LoadFlag::UnableToLoad);
                    report_not_loaded(record);
                    continue;
                }
            };

            let lifecycle = match self.backend.query_lifecycle(&mut module) {
                Some(lifecycle) => lifecycle,
                None => {
                    record.flag(LoadFlag::MissingInterface);
                    report_not_loaded(record);
                    self.backend.unload(module);
                    continue;
                }
            };

            record.mark_loaded();
            info!("Component '{}' {} loaded", record.name(), record.version_string());
            completed.push(LoadedComponent {
                id,
                name: record.name().to_string(),
                lifecycle,
                module,
            });
        }

        completed
    }

    /// Run `initialize` forwards, then `initialization_finished` backwards.
    pub fn initialize_all(&mut self, completed: &mut [LoadedComponent<B::Module>], objects: &mut ObjectRegistry) {
        for component in completed.iter_mut() {
            debug!("Initializing component '{}'", component.name);
            component.lifecycle.initialize(objects);
        }
        for component in completed.iter_mut().rev() {
            debug!("Finishing initialization of component '{}'", component.name);
            component.lifecycle.initialization_finished(objects);
        }
    }

    /// Finalize every component in reverse order, clear the registry, then
    /// drop each lifecycle handle and release its module.
    pub fn teardown(&mut self, mut completed: Vec<LoadedComponent<B::Module>>, objects: &mut ObjectRegistry) {
        for component in completed.iter_mut().rev() {
            debug!("Finalizing component '{}'", component.name);
            component.lifecycle.finalize(objects);
        }

        objects.clear();

        while let Some(component) = completed.pop() {
            let LoadedComponent {
                name,
                lifecycle,
                module,
                ..
            } = component;
            drop(lifecycle);
            self.backend.unload(module);
            info!("Component '{}' unloaded", name);
        }
    }
}

/// Check the resolved dependencies of `id`: each must be loaded and at least
/// the declared minimum version. Flags the record and returns false otherwise.
pub fn validate_dependencies(records: &mut [ComponentRecord], id: ComponentId) -> bool {
    let mut flags = Vec::new();
    let record = &records[id.index()];

    for dep in record.resolved_dependencies() {
        let dependency = &records[dep.id.index()];
        if !dependency.is_loaded() {
            warn!(
                "Component '{}' requires '{}', which is not loaded",
                record.name(),
                dependency.name()
            );
            flags.push(LoadFlag::MissingDependency);
        } else if dependency.version() < &dep.min_version {
            warn!(
                "Component '{}' requires '{}' >= {}, found {}",
                record.name(),
                dependency.name(),
                dep.min_version,
                dependency.version()
            );
            flags.push(LoadFlag::IncompatibleVersion);
        }
    }

    let record = &mut records[id.index()];
    for flag in flags {
        record.flag(flag);
    }
    !record.status().is_set()
}

fn report_not_loaded(record: &ComponentRecord) {
    warn!("Component '{}' was not loaded ({})", record.name(), record.status());
}
