//! Component registry wiring.
//!
//! The registry (`registry.yaml` at the plugin root by default) declares the
//! canonical set of components and command namespaces. This module loads it
//! through the restricted YAML schema, checks it against the bundled JSON
//! Schema contract, and exposes a sorted identity set for the validator.

pub mod loader;
pub mod model;
pub(crate) mod schema;

pub use loader::Registry;
pub use model::{RegistryDocument, RegistryEntry};

/// Default registry location relative to the plugin root.
pub const DEFAULT_REGISTRY_PATH: &str = crate::plugin_root::REGISTRY_FILE;
