use crate::component_system::registry::ObjectRegistry;

/// Lifecycle capability of a loaded component.
///
/// The loader calls [`initialize`](Self::initialize) on every loaded
/// component in load order, then
/// [`initialization_finished`](Self::initialization_finished) in reverse
/// order. At unload, [`finalize`](Self::finalize) runs in reverse load order.
/// All three default to doing nothing.
pub trait ComponentLifecycle: Send {
    /// Called once the component's dependencies have been initialized.
    fn initialize(&mut self, _objects: &mut ObjectRegistry) {}

    /// Called after every loaded component has been initialized.
    fn initialization_finished(&mut self, _objects: &mut ObjectRegistry) {}

    /// Called before the component's module is released.
    fn finalize(&mut self, _objects: &mut ObjectRegistry) {}
}
