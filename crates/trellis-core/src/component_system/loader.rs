// crates/trellis-core/src/component_system/loader.rs
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use log::{debug, info, warn};
use serde::Serialize;

use crate::component_system::backend::ModuleBackend;
use crate::component_system::dependency::DependencyResolver;
use crate::component_system::discovery::DiscoveryAdapter;
use crate::component_system::error::ComponentSystemError;
use crate::component_system::manifest::ComponentDescriptor;
use crate::component_system::orchestrator::{LifecycleOrchestrator, LoadedComponent};
use crate::component_system::record::{ComponentId, ComponentRecord};
use crate::component_system::registry::ObjectRegistry;
use crate::component_system::status::LoadFlag;
use crate::component_system::version::{RuntimeVersion, parse_minimum_version, parse_version};
use crate::config::{BuildProfile, LoaderSettings};
use crate::kernel::error::Result;

/// Phase of a loader session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Components may still be added
    Discovering,
    /// `load_components` has run and components are live
    Loaded,
    /// Components were finalized and released
    Unloaded,
}

/// Outcome of [`ComponentLoader::load_components`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub discovered: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// Host-facing component session.
///
/// Add components from one or more discovery adapters, call
/// [`load_components`](Self::load_components) once, and eventually
/// [`unload_components`](Self::unload_components). Dropping a session that
/// still has live components unloads them.
pub struct ComponentLoader<B: ModuleBackend> {
    backend: B,
    runtime_version: RuntimeVersion,
    build_profile: Option<BuildProfile>,
    records: Vec<ComponentRecord>,
    search: BTreeMap<String, ComponentId>,
    scopes: usize,
    order: Vec<ComponentId>,
    state: SessionState,
    completed: Vec<LoadedComponent<B::Module>>,
    objects: ObjectRegistry,
}

impl<B: ModuleBackend> ComponentLoader<B> {
    /// Create a session for a host advertising `runtime_version`.
    pub fn new(backend: B, runtime_version: RuntimeVersion) -> Self {
        Self {
            backend,
            runtime_version,
            build_profile: None,
            records: Vec::new(),
            search: BTreeMap::new(),
            scopes: 0,
            order: Vec::new(),
            state: SessionState::Discovering,
            completed: Vec::new(),
            objects: ObjectRegistry::new(),
        }
    }

    /// Create a session using the runtime version and build profile of `settings`.
    pub fn from_settings(backend: B, settings: &LoaderSettings) -> Result<Self> {
        let runtime_version: RuntimeVersion = settings.runtime_version.parse()?;
        Ok(Self::new(backend, runtime_version).with_build_profile(settings.build_profile))
    }

    /// Ignore components declaring a different build profile.
    pub fn with_build_profile(mut self, profile: Option<BuildProfile>) -> Self {
        self.build_profile = profile;
        self
    }

    pub fn runtime_version(&self) -> &RuntimeVersion {
        &self.runtime_version
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Discover components through `adapter` and register them.
    pub async fn add_components(&mut self, adapter: &dyn DiscoveryAdapter) -> Result<usize> {
        self.ensure_discovering()?;
        let scope = adapter.scope();
        debug!("Discovering components in {}", scope);
        let descriptors = adapter.discover().await?;
        let added = self.add_descriptors(descriptors)?;
        info!("Registered {} component(s) from {}", added, scope);
        Ok(added)
    }

    /// Register descriptors directly. Returns how many were registered;
    /// descriptors with unparseable versions or a foreign build profile are
    /// skipped.
    pub fn add_descriptors<I>(&mut self, descriptors: I) -> Result<usize>
    where
        I: IntoIterator<Item = ComponentDescriptor>,
    {
        self.ensure_discovering()?;
        self.scopes += 1;
        let mut added = 0;
        for descriptor in descriptors {
            if self.register(descriptor) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Resolve, load and initialize all registered components.
    ///
    /// `policy` is asked once per otherwise loadable component; returning
    /// false flags it `Disabled`. Runs at most once per session.
    pub fn load_components<P>(&mut self, policy: P) -> Result<LoadSummary>
    where
        P: FnMut(&ComponentRecord) -> bool,
    {
        if self.state != SessionState::Discovering {
            return Err(ComponentSystemError::AlreadyLoaded.into());
        }
        if self.scopes == 0 {
            return Err(ComponentSystemError::NoDiscoveryScope.into());
        }
        self.state = SessionState::Loaded;

        self.order = DependencyResolver::new(&mut self.records, &self.search).resolve();

        let mut orchestrator = LifecycleOrchestrator::new(&mut self.backend);
        let mut completed = orchestrator.run(&mut self.records, &self.order, policy);
        orchestrator.initialize_all(&mut completed, &mut self.objects);
        self.completed = completed;

        let summary = LoadSummary {
            discovered: self.records.len(),
            loaded: self.completed.len(),
            failed: self.records.iter().filter(|r| r.status().has_failure()).count(),
        };
        info!(
            "Loaded {} of {} component(s), {} failed",
            summary.loaded, summary.discovered, summary.failed
        );
        Ok(summary)
    }

    /// Finalize and release every loaded component. Does nothing unless
    /// components are live.
    pub fn unload_components(&mut self) {
        if self.state != SessionState::Loaded {
            return;
        }
        self.state = SessionState::Unloaded;
        let completed = std::mem::take(&mut self.completed);
        info!("Unloading {} component(s)", completed.len());
        LifecycleOrchestrator::new(&mut self.backend).teardown(completed, &mut self.objects);
    }

    /// Snapshot of every record, in registration order
    pub fn components(&self) -> Vec<ComponentRecord> {
        self.records.clone()
    }

    /// The record registered first under `name`
    pub fn component(&self, name: &str) -> Option<&ComponentRecord> {
        self.search.get(name).map(|id| &self.records[id.index()])
    }

    pub fn record(&self, id: ComponentId) -> Option<&ComponentRecord> {
        self.records.get(id.index())
    }

    /// Names in resolved load order. Empty before `load_components`.
    pub fn load_order(&self) -> Vec<String> {
        self.order
            .iter()
            .map(|id| self.records[id.index()].name().to_string())
            .collect()
    }

    /// Names of live components in initialization order
    pub fn loaded_components(&self) -> Vec<String> {
        self.completed.iter().map(|c| c.name.clone()).collect()
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    fn ensure_discovering(&self) -> Result<()> {
        if self.state != SessionState::Discovering {
            return Err(ComponentSystemError::SessionSealed.into());
        }
        Ok(())
    }

    fn register(&mut self, descriptor: ComponentDescriptor) -> bool {
        if let (Some(host), Some(declared)) = (self.build_profile, descriptor.build_profile) {
            if host != declared {
                debug!(
                    "Ignoring component '{}' built for {:?}, host is {:?}",
                    descriptor.name, declared, host
                );
                return false;
            }
        }

        let version = match parse_version(&descriptor.version) {
            Ok(version) => version,
            Err(e) => {
                warn!("Skipping component '{}': bad version: {}", descriptor.name, e);
                return false;
            }
        };
        let runtime_version: RuntimeVersion = match descriptor.runtime_version.parse() {
            Ok(version) => version,
            Err(e) => {
                warn!("Skipping component '{}': bad runtime version: {}", descriptor.name, e);
                return false;
            }
        };
        let mut dependencies = Vec::with_capacity(descriptor.dependencies.len());
        for dep in descriptor.dependencies {
            match parse_minimum_version(&dep.min_version) {
                Ok(min_version) => dependencies.push((dep.name, min_version)),
                Err(e) => {
                    warn!(
                        "Skipping component '{}': bad minimum version for '{}': {}",
                        descriptor.name, dep.name, e
                    );
                    return false;
                }
            }
        }

        let id = ComponentId(self.records.len());
        let mut record = ComponentRecord::new(
            id,
            descriptor.name,
            descriptor.source,
            version,
            runtime_version,
            dependencies,
            descriptor.can_be_disabled,
            descriptor.details,
        );

        if !self.runtime_version.is_compatible_with(record.runtime_version()) {
            warn!(
                "Component '{}' was built for runtime {}, host runs {}",
                record.name(),
                record.runtime_version(),
                self.runtime_version
            );
            record.flag(LoadFlag::IncompatibleRuntimeVersion);
        }

        match self.search.entry(record.name().to_string()) {
            Entry::Occupied(_) => {
                warn!("Component name '{}' is already registered; ignoring the duplicate", record.name());
                record.flag(LoadFlag::NameClash);
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        debug!("Registered component '{}' {} as {}", record.name(), record.version(), id);
        self.records.push(record);
        true
    }
}

impl<B: ModuleBackend> Drop for ComponentLoader<B> {
    fn drop(&mut self) {
        self.unload_components();
    }
}
