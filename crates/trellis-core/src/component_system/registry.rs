use std::any::{Any, TypeId};
use std::sync::Arc;

use log::debug;

struct RegisteredObject {
    type_id: TypeId,
    type_name: &'static str,
    object: Box<dyn Any + Send + Sync>,
}

/// Registry through which components publish and find service objects.
///
/// Objects are stored as `Arc<T>` and looked up by `T`, which may be a trait
/// object (`Arc<dyn Greeting>`). Several objects may be registered for the
/// same type; lookups return them in registration order.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: Vec<RegisteredObject>,
}

impl ObjectRegistry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// Publish an object under its type
    pub fn add<T: ?Sized + Send + Sync + 'static>(&mut self, object: Arc<T>) {
        let type_name = std::any::type_name::<T>();
        debug!("Registering object of type {}", type_name);
        self.objects.push(RegisteredObject {
            type_id: TypeId::of::<Arc<T>>(),
            type_name,
            object: Box::new(object),
        });
    }

    /// First object registered for `T`
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.iter_of::<T>().next()
    }

    /// All objects registered for `T`, oldest first
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<T>> {
        self.iter_of::<T>().collect()
    }

    /// Check whether any object is registered for `T`
    pub fn contains<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        let type_id = TypeId::of::<Arc<T>>();
        self.objects.iter().any(|entry| entry.type_id == type_id)
    }

    /// Remove a specific object. Returns false if it was not registered.
    pub fn remove<T: ?Sized + Send + Sync + 'static>(&mut self, object: &Arc<T>) -> bool {
        let type_id = TypeId::of::<Arc<T>>();
        let position = self.objects.iter().position(|entry| {
            entry.type_id == type_id
                && entry
                    .object
                    .downcast_ref::<Arc<T>>()
                    .is_some_and(|stored| Arc::ptr_eq(stored, object))
        });
        match position {
            Some(index) => {
                let removed = self.objects.remove(index);
                debug!("Removed object of type {}", removed.type_name);
                true
            }
            None => false,
        }
    }

    /// Type names of all registered objects, in registration order
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.objects.iter().map(|entry| entry.type_name).collect()
    }

    /// Number of registered objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop every registered object
    pub fn clear(&mut self) {
        if !self.objects.is_empty() {
            debug!("Clearing {} registered object(s)", self.objects.len());
        }
        self.objects.clear();
    }

    fn iter_of<T: ?Sized + Send + Sync + 'static>(&self) -> impl Iterator<Item = Arc<T>> + '_ {
        let type_id = TypeId::of::<Arc<T>>();
        self.objects
            .iter()
            .filter(move |entry| entry.type_id == type_id)
            .filter_map(|entry| entry.object.downcast_ref::<Arc<T>>().cloned())
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
