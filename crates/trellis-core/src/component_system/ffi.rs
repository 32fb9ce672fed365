//! # Shared-library components
//!
//! A component library exports one symbol, `_trellis_component`, returning a
//! heap-allocated [`ComponentVTable`]. The vtable owns the component instance
//! and knows how to free both itself and the instance, so the host never
//! frees memory that the library allocated.
//!
//! Component authors do not build vtables by hand; they implement
//! [`ComponentLifecycle`] and invoke [`export_component!`](crate::export_component).
//!
//! The host and the library must be built against the same `trellis-core`
//! version, as the [`ObjectRegistry`] is passed across the boundary by
//! pointer.
use std::any::Any;
use std::ffi::c_void;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use libloading::{Library, Symbol};
use log::{debug, error, info, warn};

use crate::component_system::backend::ModuleBackend;
use crate::component_system::error::BackendError;
use crate::component_system::lifecycle::ComponentLifecycle;
use crate::component_system::manifest::SourceLocation;
use crate::component_system::registry::ObjectRegistry;
use crate::config::UnloadPolicy;
use crate::kernel::constants::COMPONENT_ENTRY_SYMBOL;

/// Lifecycle callback: `(instance, objects)` where `objects` is a `*mut ObjectRegistry`.
pub type LifecycleFn = extern "C" fn(instance: *mut c_void, objects: *mut c_void);

/// Signature of the exported `_trellis_component` symbol. A null return
/// means the component could not be constructed.
pub type ComponentEntryFn = unsafe extern "C" fn() -> *mut ComponentVTable;

#[repr(C)]
pub struct ComponentVTable {
    pub instance: *mut c_void,
    pub initialize: LifecycleFn,
    pub initialization_finished: LifecycleFn,
    pub finalize: LifecycleFn,
    /// Frees the instance and the vtable itself
    pub destroy: extern "C" fn(vtable: *mut ComponentVTable),
}

/// Box `component` into a vtable. Ownership passes to whoever calls `destroy`.
pub fn into_vtable<T: ComponentLifecycle + 'static>(component: T) -> *mut ComponentVTable {
    let instance = Box::into_raw(Box::new(component)) as *mut c_void;
    Box::into_raw(Box::new(ComponentVTable {
        instance,
        initialize: initialize_trampoline::<T>,
        initialization_finished: initialization_finished_trampoline::<T>,
        finalize: finalize_trampoline::<T>,
        destroy: destroy_trampoline::<T>,
    }))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic reason".to_string()
    }
}

fn call_guarded<T, F>(instance: *mut c_void, objects: *mut c_void, phase: &str, call: F)
where
    T: ComponentLifecycle,
    F: FnOnce(&mut T, &mut ObjectRegistry),
{
    if instance.is_null() || objects.is_null() {
        return;
    }
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: `instance` came from `into_vtable::<T>` and `objects` points
        // at a registry the host keeps alive for the duration of the call.
        let component = unsafe { &mut *(instance as *mut T) };
        let objects = unsafe { &mut *(objects as *mut ObjectRegistry) };
        call(component, objects);
    }));
    if let Err(payload) = result {
        error!("Component panicked during {}: {}", phase, panic_message(payload.as_ref()));
    }
}

extern "C" fn initialize_trampoline<T: ComponentLifecycle>(instance: *mut c_void, objects: *mut c_void) {
    call_guarded::<T, _>(instance, objects, "initialize", |c, o| c.initialize(o));
}

extern "C" fn initialization_finished_trampoline<T: ComponentLifecycle>(instance: *mut c_void, objects: *mut c_void) {
    call_guarded::<T, _>(instance, objects, "initialization_finished", |c, o| {
        c.initialization_finished(o)
    });
}

extern "C" fn finalize_trampoline<T: ComponentLifecycle>(instance: *mut c_void, objects: *mut c_void) {
    call_guarded::<T, _>(instance, objects, "finalize", |c, o| c.finalize(o));
}

extern "C" fn destroy_trampoline<T: ComponentLifecycle>(vtable: *mut ComponentVTable) {
    if vtable.is_null() {
        return;
    }
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: both allocations were made by `into_vtable::<T>`.
        let vtable = unsafe { Box::from_raw(vtable) };
        if !vtable.instance.is_null() {
            drop(unsafe { Box::from_raw(vtable.instance as *mut T) });
        }
    }));
    if let Err(payload) = result {
        error!("Component panicked while being destroyed: {}", panic_message(payload.as_ref()));
    }
}

/// Exports a [`ComponentLifecycle`] type from a `cdylib` as `_trellis_component`.
///
/// A panic in the constructor is caught inside the library, where it was
/// raised, and the entry point returns a null vtable.
///
/// ```ignore
/// trellis_core::export_component!(Greeter, Greeter::new());
/// // or, for types implementing Default:
/// trellis_core::export_component!(Greeter);
/// ```
#[macro_export]
macro_rules! export_component {
    ($component:ty, $constructor:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _trellis_component() -> *mut $crate::component_system::ffi::ComponentVTable {
            let created = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| {
                let component: $component = $constructor;
                $crate::component_system::ffi::into_vtable(component)
            }));
            created.unwrap_or(::std::ptr::null_mut())
        }
    };
    ($component:ty) => {
        $crate::export_component!($component, <$component as ::core::default::Default>::default());
    };
}

/// Host-side view of a component vtable.
pub struct VTableComponent {
    vtable: NonNull<ComponentVTable>,
}

// The instance is only touched through `&mut self`.
unsafe impl Send for VTableComponent {}

impl VTableComponent {
    /// Take ownership of a vtable. Returns `None` for a null pointer.
    ///
    /// # Safety
    /// `vtable` must be null or come from [`into_vtable`] (directly or through
    /// [`export_component!`](crate::export_component)) and must not be owned
    /// by anything else. Its code must stay mapped until this value is dropped.
    pub unsafe fn from_raw(vtable: *mut ComponentVTable) -> Option<Self> {
        NonNull::new(vtable).map(|vtable| Self { vtable })
    }

    fn dispatch(&mut self, objects: &mut ObjectRegistry, select: fn(&ComponentVTable) -> LifecycleFn) {
        // SAFETY: the vtable stays valid until `drop`.
        let vtable = unsafe { self.vtable.as_ref() };
        let callback = select(vtable);
        callback(vtable.instance, objects as *mut ObjectRegistry as *mut c_void);
    }
}

impl ComponentLifecycle for VTableComponent {
    fn initialize(&mut self, objects: &mut ObjectRegistry) {
        self.dispatch(objects, |v| v.initialize);
    }

    fn initialization_finished(&mut self, objects: &mut ObjectRegistry) {
        self.dispatch(objects, |v| v.initialization_finished);
    }

    fn finalize(&mut self, objects: &mut ObjectRegistry) {
        self.dispatch(objects, |v| v.finalize);
    }
}

impl Drop for VTableComponent {
    fn drop(&mut self) {
        // SAFETY: we own the vtable; `destroy` frees it.
        let destroy = unsafe { self.vtable.as_ref() }.destroy;
        destroy(self.vtable.as_ptr());
    }
}

/// A shared library opened by [`LibraryBackend`].
pub struct LibraryModule {
    path: PathBuf,
    library: Library,
}

impl LibraryModule {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Backend loading components from shared libraries with `libloading`.
#[derive(Debug, Default)]
pub struct LibraryBackend {
    policy: UnloadPolicy,
    leaked: usize,
}

impl LibraryBackend {
    pub fn new(policy: UnloadPolicy) -> Self {
        Self { policy, leaked: 0 }
    }

    pub fn policy(&self) -> UnloadPolicy {
        self.policy
    }

    /// Number of libraries left mapped by `UnloadPolicy::Leak`
    pub fn leaked(&self) -> usize {
        self.leaked
    }
}

impl ModuleBackend for LibraryBackend {
    type Module = LibraryModule;

    fn load(&mut self, location: &SourceLocation) -> Result<LibraryModule, BackendError> {
        let path = match location {
            SourceLocation::Library(path) => path,
            other => {
                return Err(BackendError::UnsupportedLocation {
                    backend: "library",
                    location: other.to_string(),
                });
            }
        };
        debug!("Opening component library {}", path.display());
        // SAFETY: loading a library runs its initializers; component libraries
        // are trusted code by contract.
        let library = unsafe { Library::new(path) }.map_err(|source| BackendError::Library {
            path: path.clone(),
            source,
        })?;
        Ok(LibraryModule {
            path: path.clone(),
            library,
        })
    }

    fn query_lifecycle(&mut self, module: &mut LibraryModule) -> Option<Box<dyn ComponentLifecycle>> {
        // SAFETY: the symbol type matches what `export_component!` generates.
        let entry: Symbol<ComponentEntryFn> = match unsafe { module.library.get(COMPONENT_ENTRY_SYMBOL) } {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!("Library {} does not export a component entry point: {}", module.path.display(), e);
                return None;
            }
        };
        let entry_fn: ComponentEntryFn = *entry;
        // SAFETY: the entry point takes no arguments and catches its own panics.
        let vtable = unsafe { entry_fn() };

        // SAFETY: the vtable was produced by the library's `into_vtable` and
        // the library stays open until the lifecycle handle is dropped.
        match unsafe { VTableComponent::from_raw(vtable) } {
            Some(component) => Some(Box::new(component)),
            None => {
                warn!(
                    "Component entry point of {} returned a null vtable",
                    module.path.display()
                );
                None
            }
        }
    }

    fn unload(&mut self, module: LibraryModule) {
        match self.policy {
            UnloadPolicy::Leak => {
                info!("Leaving component library {} mapped", module.path.display());
                mem::forget(module.library);
                self.leaked += 1;
            }
            UnloadPolicy::Release => {
                debug!("Closing component library {}", module.path.display());
                drop(module.library);
            }
        }
    }
}
