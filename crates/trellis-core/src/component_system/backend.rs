//! Module backends.
//!
//! A [`ModuleBackend`] turns a [`SourceLocation`] into a live module and
//! exposes the module's [`ComponentLifecycle`]. [`BuiltinBackend`] serves
//! components compiled into the host; the shared-library backend lives in
//! [`ffi`](crate::component_system::ffi).
use std::collections::HashMap;

use log::debug;

use crate::component_system::error::BackendError;
use crate::component_system::lifecycle::ComponentLifecycle;
use crate::component_system::manifest::SourceLocation;

/// Physically loads and releases component modules.
pub trait ModuleBackend {
    /// Handle kept alive for as long as the component is loaded
    type Module;

    /// Load the module at `location`.
    fn load(&mut self, location: &SourceLocation) -> Result<Self::Module, BackendError>;

    /// Lifecycle capability of a loaded module, or `None` if it has none.
    fn query_lifecycle(&mut self, module: &mut Self::Module) -> Option<Box<dyn ComponentLifecycle>>;

    /// Release a module. Never fails; a backend may choose to keep the code mapped.
    fn unload(&mut self, module: Self::Module);
}

/// Module produced by a [`BuiltinBackend`] factory.
pub struct BuiltinModule {
    key: String,
    lifecycle: Option<Box<dyn ComponentLifecycle>>,
}

impl BuiltinModule {
    pub fn with_lifecycle<L: ComponentLifecycle + 'static>(key: impl Into<String>, lifecycle: L) -> Self {
        Self {
            key: key.into(),
            lifecycle: Some(Box::new(lifecycle)),
        }
    }

    /// A module that loads fine but exposes no lifecycle capability.
    pub fn without_interface(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            lifecycle: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

type ModuleFactory = Box<dyn FnMut(&str) -> Result<BuiltinModule, String> + Send>;

/// Backend for components compiled into the host, keyed by name.
#[derive(Default)]
pub struct BuiltinBackend {
    factories: HashMap<String, ModuleFactory>,
    unloaded: Vec<String>,
}

impl BuiltinBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible factory under `key`. Replaces any previous one.
    pub fn register_factory<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: FnMut(&str) -> Result<BuiltinModule, String> + Send + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    /// Register a factory producing a fresh lifecycle on every load.
    pub fn register<L, F>(&mut self, key: impl Into<String>, mut make: F)
    where
        L: ComponentLifecycle + 'static,
        F: FnMut() -> L + Send + 'static,
    {
        self.register_factory(key, move |key| Ok(BuiltinModule::with_lifecycle(key, make())));
    }

    /// Register a module that has no lifecycle capability.
    pub fn register_without_interface(&mut self, key: impl Into<String>) {
        self.register_factory(key, |key| Ok(BuiltinModule::without_interface(key)));
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Keys of released modules, in release order
    pub fn unloaded(&self) -> &[String] {
        &self.unloaded
    }
}

impl ModuleBackend for BuiltinBackend {
    type Module = BuiltinModule;

    fn load(&mut self, location: &SourceLocation) -> Result<BuiltinModule, BackendError> {
        let key = match location {
            SourceLocation::Builtin(key) => key,
            other => {
                return Err(BackendError::UnsupportedLocation {
                    backend: "builtin",
                    location: other.to_string(),
                });
            }
        };
        let factory = self
            .factories
            .get_mut(key)
            .ok_or_else(|| BackendError::UnknownModule(key.clone()))?;
        factory(key).map_err(|message| BackendError::Factory {
            key: key.clone(),
            message,
        })
    }

    fn query_lifecycle(&mut self, module: &mut BuiltinModule) -> Option<Box<dyn ComponentLifecycle>> {
        module.lifecycle.take()
    }

    fn unload(&mut self, module: BuiltinModule) {
        debug!("Releasing builtin module '{}'", module.key);
        self.unloaded.push(module.key);
    }
}
