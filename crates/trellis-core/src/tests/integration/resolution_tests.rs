#![cfg(test)]

use crate::component_system::manifest::ComponentDescriptor;
use crate::component_system::policy::allow_all;
use crate::component_system::status::LoadFlag;
use crate::kernel::error::Result;
use crate::tests::integration::common::{calls, loader_with, new_tracker, tracking_backend};

#[test]
fn test_version_gate_scenario() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["A", "B", "C"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("C", "1.0").depends_on("B", "1.0").depends_on("A", "2.0"),
        ComponentDescriptor::builtin("B", "1.0").depends_on("A", "1.0"),
        ComponentDescriptor::builtin("A", "1.0"),
    ])?;

    let summary = loader.load_components(allow_all)?;

    assert_eq!(loader.load_order(), vec!["A", "B", "C"]);
    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.failed, 1);

    assert!(loader.component("A").unwrap().is_loaded());
    assert!(loader.component("B").unwrap().is_loaded());
    let c = loader.component("C").unwrap();
    assert!(!c.is_loaded());
    assert!(c.status().contains(LoadFlag::IncompatibleVersion));
    assert!(!c.status().contains(LoadFlag::Loaded));

    assert_eq!(calls(&tracker, "initialize"), vec!["A", "B"]);
    assert_eq!(calls(&tracker, "finished"), vec!["B", "A"]);
    Ok(())
}

#[test]
fn test_cycle_terminates_and_loads_neither() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["X", "Y"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("X", "1.0").depends_on("Y", ""),
        ComponentDescriptor::builtin("Y", "1.0").depends_on("X", ""),
    ])?;

    let summary = loader.load_components(allow_all)?;

    let order = loader.load_order();
    assert_eq!(order.len(), 2);
    assert!(order.contains(&"X".to_string()));
    assert!(order.contains(&"Y".to_string()));

    assert_eq!(summary.loaded, 0);
    for name in ["X", "Y"] {
        let record = loader.component(name).unwrap();
        assert!(record.status().contains(LoadFlag::MissingDependency), "{} should be flagged", name);
        assert!(!record.is_loaded());
    }
    assert!(tracker.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_cycle_dependents_fail_too() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["X", "Y", "Z", "Free"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("X", "1.0").depends_on("Y", ""),
        ComponentDescriptor::builtin("Y", "1.0").depends_on("X", ""),
        ComponentDescriptor::builtin("Z", "1.0").depends_on("X", ""),
        ComponentDescriptor::builtin("Free", "1.0"),
    ])?;

    loader.load_components(allow_all)?;

    assert!(loader.component("Z").unwrap().status().contains(LoadFlag::MissingDependency));
    assert!(loader.component("Free").unwrap().is_loaded());
    assert_eq!(calls(&tracker, "initialize"), vec!["Free"]);
    Ok(())
}

#[test]
fn test_unknown_dependency_is_missing() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["A"], &tracker));
    loader.add_descriptors(vec![ComponentDescriptor::builtin("A", "1.0").depends_on("Ghost", "1.0")])?;

    loader.load_components(allow_all)?;

    let a = loader.component("A").unwrap();
    assert_eq!(a.missing_dependencies(), &["Ghost".to_string()]);
    assert!(a.status().contains(LoadFlag::MissingDependency));
    assert!(!a.status().contains(LoadFlag::Loaded));
    // Excluded records never enter the load order
    assert!(loader.load_order().is_empty());
    Ok(())
}

#[test]
fn test_missing_dependency_cascades() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["A", "B"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("A", "1.0").depends_on("Ghost", ""),
        ComponentDescriptor::builtin("B", "1.0").depends_on("A", ""),
    ])?;

    loader.load_components(allow_all)?;

    let b = loader.component("B").unwrap();
    assert!(b.status().contains(LoadFlag::MissingDependency));
    assert!(b.missing_dependencies().is_empty());
    assert!(tracker.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_name_clash_first_registration_wins() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["Dup"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("Dup", "1.0").with_vendor("First"),
        ComponentDescriptor::builtin("Dup", "2.0").with_vendor("Second"),
    ])?;

    loader.load_components(allow_all)?;

    let records = loader.components();
    assert_eq!(records.len(), 2);
    assert!(records[0].is_loaded());
    assert!(records[1].status().contains(LoadFlag::NameClash));
    assert!(!records[1].is_loaded());

    let found = loader.component("Dup").unwrap();
    assert_eq!(found.identifier(), "dup.first");
    assert_eq!(loader.load_order(), vec!["Dup"]);
    Ok(())
}

#[test]
fn test_incompatible_runtime_blocks_dependents() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["Old", "User"], &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("Old", "1.0").with_runtime_version("1.0.0"),
        ComponentDescriptor::builtin("User", "1.0").depends_on("Old", ""),
    ])?;

    loader.load_components(allow_all)?;

    let old = loader.component("Old").unwrap();
    assert!(old.status().contains(LoadFlag::IncompatibleRuntimeVersion));
    let user = loader.component("User").unwrap();
    assert!(user.status().contains(LoadFlag::MissingDependency));
    assert_eq!(loader.load_order(), vec!["User"]);
    Ok(())
}

#[test]
fn test_failure_flags_never_become_loaded() -> Result<()> {
    let tracker = new_tracker();
    let mut backend = tracking_backend(&["Good", "Needy"], &tracker);
    backend.register_without_interface("Hollow");
    let mut loader = loader_with(backend);
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("Good", "1.0"),
        ComponentDescriptor::builtin("Hollow", "1.0"),
        ComponentDescriptor::builtin("Unbuilt", "1.0"),
        ComponentDescriptor::builtin("Needy", "1.0").depends_on("Hollow", ""),
        ComponentDescriptor::builtin("Skipped", "1.0"),
    ])?;

    loader.load_components(|record| record.name() != "Skipped")?;

    assert!(loader.component("Hollow").unwrap().status().contains(LoadFlag::MissingInterface));
    assert!(loader.component("Unbuilt").unwrap().status().contains(LoadFlag::UnableToLoad));
    assert!(loader.component("Needy").unwrap().status().contains(LoadFlag::MissingDependency));
    assert!(loader.component("Skipped").unwrap().status().contains(LoadFlag::Disabled));

    for record in loader.components() {
        if record.status().has_failure() {
            assert!(!record.status().contains(LoadFlag::Loaded), "{} has failure and Loaded", record.name());
            assert!(!record.is_loaded());
        } else {
            assert!(record.is_loaded());
        }
    }
    Ok(())
}

#[test]
fn test_acyclic_order_respects_dependencies() -> Result<()> {
    let names = ["Core", "Net", "Storage", "Ui", "App"];
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&names, &tracker));
    loader.add_descriptors(vec![
        ComponentDescriptor::builtin("App", "1.0").depends_on("Ui", "").depends_on("Storage", ""),
        ComponentDescriptor::builtin("Ui", "1.0").depends_on("Core", ""),
        ComponentDescriptor::builtin("Storage", "1.0").depends_on("Net", "").depends_on("Core", ""),
        ComponentDescriptor::builtin("Net", "1.0").depends_on("Core", ""),
        ComponentDescriptor::builtin("Core", "1.0"),
    ])?;

    loader.load_components(allow_all)?;

    let order = loader.load_order();
    let position = |name: &str| order.iter().position(|n| n == name).unwrap();
    for record in loader.components() {
        for dep in record.resolved_dependencies() {
            assert!(
                position(&dep.name) < position(record.name()),
                "{} must come after {}",
                record.name(),
                dep.name
            );
        }
    }
    assert_eq!(calls(&tracker, "initialize"), order);
    Ok(())
}
