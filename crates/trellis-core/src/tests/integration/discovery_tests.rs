#![cfg(test)]

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::component_system::discovery::{ManifestDirectory, StaticDiscovery};
use crate::component_system::ffi::LibraryBackend;
use crate::component_system::loader::ComponentLoader;
use crate::component_system::manifest::ComponentDescriptor;
use crate::component_system::policy::{DisabledComponents, allow_all};
use crate::component_system::status::LoadFlag;
use crate::config::{BuildProfile, LoaderSettings, UnloadPolicy};
use crate::kernel::error::Result;
use crate::tests::integration::common::{calls, loader_with, new_tracker, tracking_backend};

fn write_component(root: &Path, dir: &str, manifest: &str) {
    let component_dir = root.join(dir);
    fs::create_dir_all(&component_dir).expect("Failed to create component dir");
    fs::write(component_dir.join("component.json"), manifest).expect("Failed to write manifest");
}

#[tokio::test]
async fn test_manifest_components_without_library_are_unable_to_load() -> Result<()> {
    let tmp_dir = tempdir().expect("Failed to create temp directory");
    write_component(
        tmp_dir.path(),
        "core",
        r#"{"name": "Core", "version": "1.0.0", "runtime_version": "0.1.0", "vendor": "Acme"}"#,
    );
    write_component(
        tmp_dir.path(),
        "shell",
        r#"{"name": "Shell", "version": "1.0.0", "runtime_version": "0.1.0", "vendor": "Acme",
            "dependencies": [{"name": "Core", "version": "1.0"}]}"#,
    );
    write_component(tmp_dir.path(), "broken", "{ not json");

    let settings = LoaderSettings {
        unload_policy: UnloadPolicy::Release,
        ..LoaderSettings::default()
    };
    let mut loader = ComponentLoader::from_settings(LibraryBackend::new(settings.unload_policy), &settings)?;
    let added = loader
        .add_components(&ManifestDirectory::new(tmp_dir.path()))
        .await?;
    assert_eq!(added, 2);

    let summary = loader.load_components(DisabledComponents::from_settings(&settings).into_policy())?;
    assert_eq!(summary.loaded, 0);
    assert_eq!(loader.load_order(), vec!["Core", "Shell"]);

    let core = loader.component("Core").unwrap();
    assert_eq!(core.identifier(), "core.acme");
    assert!(core.status().contains(LoadFlag::UnableToLoad));
    let shell = loader.component("Shell").unwrap();
    assert!(shell.status().contains(LoadFlag::MissingDependency));
    Ok(())
}

#[tokio::test]
async fn test_multiple_scopes_accumulate() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["A", "B"], &tracker));

    let missing_dir = tempdir().expect("Failed to create temp directory");
    let nowhere = ManifestDirectory::new(missing_dir.path().join("does-not-exist"));
    assert_eq!(loader.add_components(&nowhere).await?, 0);

    let first = StaticDiscovery::new(vec![ComponentDescriptor::builtin("A", "1.0")]);
    let second: StaticDiscovery = vec![ComponentDescriptor::builtin("B", "1.0").depends_on("A", "1")]
        .into_iter()
        .collect();
    assert_eq!(loader.add_components(&first).await?, 1);
    assert_eq!(loader.add_components(&second).await?, 1);

    loader.load_components(allow_all)?;
    assert_eq!(calls(&tracker, "initialize"), vec!["A", "B"]);
    Ok(())
}

#[tokio::test]
async fn test_build_profile_mismatch_is_ignored() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["Dbg", "Rel", "Any"], &tracker))
        .with_build_profile(Some(BuildProfile::Release));

    let adapter = StaticDiscovery::new(vec![
        ComponentDescriptor::builtin("Dbg", "1.0").with_build_profile(BuildProfile::Debug),
        ComponentDescriptor::builtin("Rel", "1.0").with_build_profile(BuildProfile::Release),
        ComponentDescriptor::builtin("Any", "1.0"),
    ]);
    assert_eq!(loader.add_components(&adapter).await?, 2);

    loader.load_components(allow_all)?;
    assert!(loader.component("Dbg").is_none());
    assert_eq!(calls(&tracker, "initialize"), vec!["Any", "Rel"]);
    Ok(())
}

#[tokio::test]
async fn test_bad_versions_are_skipped() -> Result<()> {
    let tracker = new_tracker();
    let mut loader = loader_with(tracking_backend(&["Ok"], &tracker));
    let adapter = StaticDiscovery::new(vec![
        ComponentDescriptor::builtin("BadVersion", "one.two"),
        ComponentDescriptor::builtin("BadRuntime", "1.0").with_runtime_version(""),
        ComponentDescriptor::builtin("BadDep", "1.0").depends_on("Ok", "x.y"),
        ComponentDescriptor::builtin("Ok", "1.0"),
    ]);

    assert_eq!(loader.add_components(&adapter).await?, 1);
    assert_eq!(loader.components().len(), 1);
    Ok(())
}
