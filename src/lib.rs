//! Alignment and dependency-graph validation for plugin component trees.
//!
//! A plugin root holds a `registry.yaml` and one directory per component
//! kind. [`validate`] loads the registry, scans the tree, assembles the
//! reference graph and runs every rule, returning violations and the
//! reverse (`used_by`) index.

pub mod component;
pub mod config;
pub mod discovery;
pub mod error;
pub mod frontmatter;
pub mod graph;
pub mod path_resolver;
pub mod plugin_root;
pub mod registry;
pub mod report;
pub mod reverse_index;
pub mod safe_yaml;
pub mod validator;
pub mod violation;

pub use component::{Component, ComponentKey, ComponentKind, ComponentRef};
pub use config::ValidateOptions;
pub use error::{FrontmatterError, PathSecurityError, RegistryError, ValidateError, YamlError};
pub use graph::{ComponentGraph, NodeId};
pub use registry::Registry;
pub use report::Report;
pub use reverse_index::ReverseIndex;
pub use validator::Validator;
pub use violation::{Detail, ErrorClass, ErrorKind, Severity, Violation};

use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Outcome of one validation run.
#[derive(Debug, Clone)]
pub struct Validation {
    /// Canonical plugin root that was validated.
    pub root: PathBuf,
    pub registry_version: String,
    /// Sorted violations and warnings.
    pub violations: Vec<Violation>,
    pub reverse_index: ReverseIndex,
    pub component_count: usize,
    pub reference_count: usize,
}

impl Validation {
    pub fn report(&self) -> Report {
        Report::new(self.violations.clone())
    }

    pub fn is_clean(&self) -> bool {
        !self.violations.iter().any(Violation::is_error)
    }
}

/// Validate `root` with default options.
pub fn validate(root: &Path) -> Result<Validation, ValidateError> {
    validate_with(root, &ValidateOptions::default())
}

/// Validate `root`.
///
/// Only a missing root or an unusable registry is an `Err`; everything found
/// in the component tree is reported as a violation.
pub fn validate_with(root: &Path, options: &ValidateOptions) -> Result<Validation, ValidateError> {
    if !root.is_dir() {
        return Err(ValidateError::MissingRoot(root.to_path_buf()));
    }
    let root = fs::canonicalize(root).map_err(|source| ValidateError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let registry_path = registry_location(&root, &options.registry)?;
    let registry = Registry::load(&registry_path, &options.yaml_limits)?;
    let scan = discovery::scan(&root, options);

    let mut graph = ComponentGraph::new();
    for key in registry.keys() {
        graph.add_node(Component::from_registry(key.clone()));
    }
    for component in scan.components {
        graph.add_node(component);
    }
    graph.connect_declared_refs();

    let mut violations = scan.violations;
    violations.extend(Validator::new(&root, &registry, &graph).run());
    validator::sort_violations(&mut violations);

    let reverse_index = ReverseIndex::build(&graph);
    info!(
        root = %root.display(),
        components = graph.node_count(),
        references = graph.edge_count(),
        violations = violations.len(),
        "validated plugin"
    );

    Ok(Validation {
        registry_version: registry.version().to_string(),
        component_count: graph.node_count(),
        reference_count: graph.edge_count(),
        root,
        violations,
        reverse_index,
    })
}

// Relative registry paths are confined to the root like any other candidate.
fn registry_location(root: &Path, registry: &Path) -> Result<PathBuf, ValidateError> {
    if registry.is_absolute() {
        return Ok(registry.to_path_buf());
    }
    let candidate = registry.to_string_lossy();
    path_resolver::resolve(root, &candidate).map_err(|source| ValidateError::RegistryPath {
        path: candidate.into_owned(),
        source,
    })
}

/// Locate the plugin root when none was given explicitly.
///
/// Checks `PLUGIN_ALIGN_ROOT`, then walks up from the working directory
/// looking for `registry.yaml`, then falls back to the build-time
/// `PLUGIN_ALIGN_ROOT_HINT`.
pub fn find_plugin_root() -> Result<PathBuf, ValidateError> {
    if let Ok(env_root) = env::var(config::ENV_ROOT) {
        if let Some(root) = plugin_root::existing_dir(&env_root) {
            return Ok(root);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = plugin_root::search_upwards(&cwd) {
            return Ok(root);
        }
    }

    if let Some(hint) = option_env!("PLUGIN_ALIGN_ROOT_HINT") {
        if let Some(root) = plugin_root::root_from_hint(hint) {
            return Ok(root);
        }
    }

    Err(ValidateError::RootNotFound)
}
