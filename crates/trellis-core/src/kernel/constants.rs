/// Application name
pub const APP_NAME: &str = "Trellis";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime version components are built against. Only the major part
/// has to match for a component to be considered loadable.
pub const RUNTIME_VERSION: &str = "0.1.0";

/// Manifest file looked up in every component directory
pub const MANIFEST_FILE_NAME: &str = "component.json";

/// Default host configuration file
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Default components directory
pub const DEFAULT_COMPONENTS_DIR: &str = "components";

/// Symbol a component library exports to hand out its lifecycle vtable
pub const COMPONENT_ENTRY_SYMBOL: &[u8] = b"_trellis_component\0";
