//! # Trellis Component System
//!
//! Discovers components, orders them by their declared dependencies and
//! drives each one through its lifecycle.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`discovery`]**: The [`DiscoveryAdapter`] trait plus manifest-directory
//!   and in-memory adapters producing [`ComponentDescriptor`]s.
//! - **[`manifest`]**: Descriptor types and the `component.json` format.
//! - **[`record`]**: [`ComponentRecord`], a discovered component with its
//!   load status and resolved dependency edges.
//! - **[`status`]**: [`LoadFlag`] and the append-only [`LoadStatus`] set.
//! - **[`version`]**: Lenient version parsing and the runtime compatibility check.
//! - **[`dependency`]**: Links dependencies and computes the load order.
//! - **[`orchestrator`]**: Loads components in order and sequences the
//!   lifecycle callbacks and teardown.
//! - **[`loader`]**: [`ComponentLoader`], the session a host works with.
//! - **[`backend`]** and **[`ffi`]**: [`ModuleBackend`] implementations for
//!   in-process modules and shared libraries.
//! - **[`lifecycle`]**: The [`ComponentLifecycle`] trait components implement.
//! - **[`registry`]**: [`ObjectRegistry`], where components publish service objects.
//! - **[`policy`]**: Selection policies such as [`DisabledComponents`].
//! - **[`error`]**: [`ComponentSystemError`] and [`BackendError`].
pub mod backend;
pub mod dependency;
pub mod discovery;
pub mod error;
pub mod ffi;
pub mod lifecycle;
pub mod loader;
pub mod manifest;
pub mod orchestrator;
pub mod policy;
pub mod record;
pub mod registry;
pub mod status;
pub mod version;

pub use backend::{BuiltinBackend, BuiltinModule, ModuleBackend};
pub use discovery::{DiscoveryAdapter, ManifestDirectory, StaticDiscovery};
pub use error::{BackendError, ComponentSystemError};
pub use ffi::{LibraryBackend, VTableComponent};
pub use lifecycle::ComponentLifecycle;
pub use loader::{ComponentLoader, LoadSummary, SessionState};
pub use manifest::{ComponentDescriptor, ComponentDetails, RawDependency, SourceLocation};
pub use policy::{DisabledComponents, allow_all};
pub use record::{ComponentId, ComponentRecord, ResolvedDependency};
pub use registry::ObjectRegistry;
pub use status::{LoadFlag, LoadStatus};
pub use version::RuntimeVersion;
