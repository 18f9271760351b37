use crate::component::ComponentKind;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Typed registry document. Mirrors `schema/registry.schema.json`.
pub struct RegistryDocument {
    pub version: String,
    #[serde(default)]
    pub command_namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub mcps: Option<Vec<RegistryEntry>>,
    #[serde(default)]
    pub commands: Option<Vec<RegistryEntry>>,
    #[serde(default)]
    pub skills: Option<Vec<RegistryEntry>>,
    #[serde(default)]
    pub agents: Option<Vec<RegistryEntry>>,
    #[serde(default)]
    pub workflows: Option<Vec<RegistryEntry>>,
}

impl RegistryDocument {
    pub fn entries(&self, kind: ComponentKind) -> &[RegistryEntry] {
        let list = match kind {
            ComponentKind::Mcp => &self.mcps,
            ComponentKind::Command => &self.commands,
            ComponentKind::Skill => &self.skills,
            ComponentKind::Agent => &self.agents,
            ComponentKind::Workflow => &self.workflows,
        };
        list.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
/// A registry list item: a bare id, or a mapping with an `id` key.
pub enum RegistryEntry {
    Id(String),
    Detailed {
        id: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },
}

impl RegistryEntry {
    pub fn id(&self) -> &str {
        match self {
            RegistryEntry::Id(id) => id,
            RegistryEntry::Detailed { id, .. } => id,
        }
    }
}
