//! Registry loading.
//!
//! The loader is strict about the document shape (schema contract plus typed
//! decoding) but deliberately lenient about id contents: malformed ids are
//! kept so the validator can report them as format violations instead of the
//! whole run failing.

use crate::component::{ComponentKey, ComponentKind};
use crate::error::RegistryError;
use crate::registry::model::RegistryDocument;
use crate::registry::schema::validate_document;
use crate::safe_yaml::{YamlLimits, parse_restricted};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
/// Declared component identities plus the metadata the format rules need.
pub struct Registry {
    path: PathBuf,
    version: String,
    command_namespaces: BTreeSet<String>,
    declarations: BTreeMap<ComponentKey, usize>,
}

impl Registry {
    /// Read and validate the registry at `path`.
    pub fn load(path: &Path, limits: &YamlLimits) -> Result<Self, RegistryError> {
        let source = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &source, limits)
    }

    /// Build a registry from YAML text; `path` is only used for diagnostics.
    pub fn from_source(
        path: &Path,
        source: &str,
        limits: &YamlLimits,
    ) -> Result<Self, RegistryError> {
        let value = parse_restricted(source, limits).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        validate_document(path, &value)?;
        let document: RegistryDocument =
            serde_json::from_value(value).map_err(|err| RegistryError::Schema {
                path: path.to_path_buf(),
                details: err.to_string(),
            })?;

        let registry = Self::from_document(path, document);
        debug!(
            path = %path.display(),
            version = %registry.version,
            components = registry.declarations.len(),
            "loaded registry"
        );
        Ok(registry)
    }

    fn from_document(path: &Path, document: RegistryDocument) -> Self {
        let mut declarations: BTreeMap<ComponentKey, usize> = BTreeMap::new();
        for kind in ComponentKind::ALL {
            for entry in document.entries(kind) {
                *declarations
                    .entry(ComponentKey::new(kind, entry.id()))
                    .or_default() += 1;
            }
        }

        Self {
            path: path.to_path_buf(),
            version: document.version,
            command_namespaces: document
                .command_namespaces
                .unwrap_or_default()
                .into_iter()
                .collect(),
            declarations,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Declared command namespaces; empty when the registry does not restrict
    /// them.
    pub fn command_namespaces(&self) -> &BTreeSet<String> {
        &self.command_namespaces
    }

    /// Declared identities in `(kind, id)` order, each once.
    pub fn keys(&self) -> impl Iterator<Item = &ComponentKey> {
        self.declarations.keys()
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.declarations.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Identities listed more than once, with their declaration count.
    pub fn duplicates(&self) -> impl Iterator<Item = (&ComponentKey, usize)> {
        self.declarations
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(key, count)| (key, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(source: &str) -> Result<Registry, RegistryError> {
        Registry::from_source(Path::new("registry.yaml"), source, &YamlLimits::default())
    }

    #[test]
    fn flattens_all_kinds() {
        let registry = load(
            r#"
version: "1.2.0"
command_namespaces: [dev, git]
mcps: [context7]
commands:
  - /dev:commit
  - id: /git:sync
    description: Sync branches
skills: [methodology/writing-plans]
agents: [fullstack-developer]
workflows: [delivery/feature]
"#,
        )
        .unwrap();

        assert_eq!(registry.version(), "1.2.0");
        assert_eq!(
            registry.command_namespaces().iter().collect::<Vec<_>>(),
            ["dev", "git"]
        );
        let keys: Vec<String> = registry.keys().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            [
                "mcp:context7",
                "command:/dev:commit",
                "command:/git:sync",
                "skill:methodology/writing-plans",
                "agent:fullstack-developer",
                "workflow:delivery/feature",
            ]
        );
    }

    #[test]
    fn counts_duplicates() {
        let registry = load("version: \"1\"\nagents: [tester, tester, reviewer]\n").unwrap();
        assert_eq!(registry.len(), 2);
        let dups: Vec<(String, usize)> = registry
            .duplicates()
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        assert_eq!(dups, [("agent:tester".to_string(), 2)]);
    }

    #[test]
    fn keeps_malformed_ids_for_the_validator() {
        let registry = load("version: \"1\"\nskills: [writing-plans]\n").unwrap();
        assert!(registry.contains(&ComponentKey::new(ComponentKind::Skill, "writing-plans")));
    }

    #[test]
    fn rejects_tagged_registry() {
        let err = load("version: \"1\"\nagents: !!python/object:list [x]\n").unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }

    #[test]
    fn rejects_schema_violations() {
        assert!(matches!(
            load("agents: [tester]\n"),
            Err(RegistryError::Schema { .. })
        ));
        assert!(matches!(load(""), Err(RegistryError::Schema { .. })));
    }
}
