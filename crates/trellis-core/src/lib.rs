pub mod component_system;
pub mod config;
pub mod kernel;

// Re-export the types hosts and component authors use most
pub use component_system::{
    BuiltinBackend, ComponentDescriptor, ComponentLifecycle, ComponentLoader, ComponentRecord,
    DisabledComponents, LibraryBackend, LoadFlag, LoadStatus, ManifestDirectory, ObjectRegistry,
    StaticDiscovery,
};
pub use config::LoaderSettings;
pub use kernel::error::{Error, Result};

#[cfg(test)]
mod tests;
