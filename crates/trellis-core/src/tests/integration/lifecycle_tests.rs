#![cfg(test)]

use std::sync::{Arc, Mutex};

use crate::component_system::backend::BuiltinBackend;
use crate::component_system::error::ComponentSystemError;
use crate::component_system::lifecycle::ComponentLifecycle;
use crate::component_system::loader::SessionState;
use crate::component_system::manifest::ComponentDescriptor;
use crate::component_system::policy::{DisabledComponents, allow_all};
use crate::component_system::registry::ObjectRegistry;
use crate::component_system::status::LoadFlag;
use crate::kernel::error::{Error, Result};
use crate::tests::integration::common::{Tracker, calls, loader_with, new_tracker, tracking_backend};

fn two_component_session(tracker: &Tracker) -> Result<crate::component_system::ComponentLoader<BuiltinBackend>> {
    let mut loader = loader_with(tracking_backend(&["A", "B"], tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("B", "1.0").depends_on("A", "1.0"),
        ComponentDescriptor::builtin("A", "1.0"),
    ])?;
    Ok(loader)
}

#[test]
fn test_finalize_runs_in_reverse_order() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = two_component_session(&tracker)?;
    loader.load_components(allow_all)?;

    loader.unload_components();

    assert_eq!(calls(&tracker, "initialize"), vec!["A", "B"]);
    assert_eq!(calls(&tracker, "finished"), vec!["B", "A"]);
    assert_eq!(calls(&tracker, "finalize"), vec!["B", "A"]);
    assert_eq!(loader.backend().unloaded(), &["B".to_string(), "A".to_string()]);
    assert_eq!(loader.state(), SessionState::Unloaded);
    Ok(())
}

#[test]
fn test_full_callback_sequence() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = two_component_session(&tracker)?;
    loader.load_components(allow_all)?;
    loader.unload_components();

    let all = tracker.lock().unwrap().clone();
    assert_eq!(
        all,
        vec![
            "initialize:A",
            "initialize:B",
            "finished:B",
            "finished:A",
            "finalize:B",
            "finalize:A",
        ]
    );
    Ok(())
}

#[test]
fn test_unload_is_idempotent() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = two_component_session(&tracker)?;
    loader.load_components(allow_all)?;

    loader.unload_components();
    loader.unload_components();

    assert_eq!(calls(&tracker, "finalize").len(), 2);
    Ok(())
}

#[test]
fn test_unload_before_load_is_noop() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = two_component_session(&tracker)?;
    loader.unload_components();
    assert!(tracker.lock().unwrap().is_empty());
    assert_eq!(loader.state(), SessionState::Discovering);
    Ok(())
}

#[test]
fn test_drop_tears_down_loaded_session() -> Result<()> {
    let tracker = new_tracker();
    {
        let mut loader = two_component_session(&tracker)?;
        loader.load_components(allow_all)?;
    }
    assert_eq!(calls(&tracker, "finalize"), vec!["B", "A"]);
    Ok(())
}

#[test]
fn test_load_without_scope_fails() {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&[], &tracker));
    let result = loader.load_components(allow_all);
    assert!(matches!(
        result,
        Err(Error::ComponentSystem(ComponentSystemError::NoDiscoveryScope))
    ));
}

#[test]
fn test_empty_scope_loads_nothing() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&[], &tracker));
    loader.add_descriptors(Vec::new())?;
    let summary = loader.load_components(allow_all)?;
    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.loaded, 0);
    Ok(())
}

#[test]
fn test_second_load_is_rejected() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = two_component_session(&tracker)?;
    loader.load_components(allow_all)?;

    let result = loader.load_components(allow_all);
    assert!(matches!(
        result,
        Err(Error::ComponentSystem(ComponentSystemError::AlreadyLoaded))
    ));
    assert_eq!(calls(&tracker, "initialize"), vec!["A", "B"]);
    Ok(())
}

#[test]
fn test_session_sealed_after_load() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = two_component_session(&tracker)?;
    loader.load_components(allow_all)?;

    let result = loader.add_descriptors(vec![ComponentDescriptor::builtin("Late", "1.0")]);
    assert!(matches!(
        result,
        Err(Error::ComponentSystem(ComponentSystemError::SessionSealed))
    ));
    assert_eq!(loader.components().len(), 2);
    Ok(())
}

#[test]
fn test_disabled_list_policy() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["A", "B", "Pinned"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("A", "1.0").with_vendor("Acme"),
        ComponentDescriptor::builtin("B", "1.0").with_vendor("Acme").depends_on("A", ""),
        ComponentDescriptor::builtin("Pinned", "1.0").with_vendor("Acme").not_disableable(),
    ])?;

    let policy = DisabledComponents::new(["a.acme", "pinned.acme"]);
    loader.load_components(policy.into_policy())?;

    assert!(loader.component("A").unwrap().status().contains(LoadFlag::Disabled));
    assert!(loader.component("B").unwrap().status().contains(LoadFlag::MissingDependency));
    assert!(loader.component("Pinned").unwrap().is_loaded());
    assert_eq!(calls(&tracker, "initialize"), vec!["Pinned"]);
    Ok(())
}

trait Greeting: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeting for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

struct Provider {
    published: Option<Arc<dyn Greeting>>,
}

impl ComponentLifecycle for Provider {
    fn initialize(&mut self, objects: &mut ObjectRegistry) {
        let greeting: Arc<dyn Greeting> = Arc::new(English);
        objects.add(greeting.clone());
        self.published = Some(greeting);
    }

    fn finalize(&mut self, objects: &mut ObjectRegistry) {
        if let Some(greeting) = self.published.take() {
            objects.remove(&greeting);
        }
    }
}

struct Consumer {
    seen: Arc<Mutex<Vec<String>>>,
}

impl ComponentLifecycle for Consumer {
    fn initialize(&mut self, objects: &mut ObjectRegistry) {
        if let Some(greeting) = objects.get::<dyn Greeting>() {
            self.seen.lock().unwrap().push(greeting.greet());
        }
    }

    fn initialization_finished(&mut self, objects: &mut ObjectRegistry) {
        let count = objects.get_all::<dyn Greeting>().len();
        self.seen.lock().unwrap().push(format!("count={}", count));
    }
}

#[test]
fn test_components_share_objects_through_registry() -> Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut backend = BuiltinBackend::new();
    backend.register("Provider", || Provider { published: None });
    let consumer_seen = seen.clone();
    backend.register("Consumer", move || Consumer {
        seen: consumer_seen.clone(),
    });

    let mut loader = loader_with(backend);
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("Consumer", "1.0").depends_on("Provider", ""),
        ComponentDescriptor::builtin("Provider", "1.0"),
    ])?;
    loader.load_components(allow_all)?;

    assert_eq!(*seen.lock().unwrap(), vec!["hello", "count=1"]);
    assert!(loader.objects().contains::<dyn Greeting>());

    loader.unload_components();
    assert!(loader.objects().is_empty());
    Ok(())
}

#[test]
fn test_registry_cleared_before_release() -> Result<()> {
    let mut backend = BuiltinBackend::new();
    backend.register("Holder", || Provider { published: None });
    let mut loader = loader_with(backend);
    loader.add_descriptors(vec![ComponentDescriptor::builtin("Holder", "1.0")])?;
    loader.load_components(allow_all)?;

    // An object the component never removes itself
    loader.objects_mut().add(Arc::new(42u32));
    loader.unload_components();

    assert!(loader.objects().is_empty());
    assert_eq!(loader.backend().unloaded(), &["Holder".to_string()]);
    Ok(())
}
