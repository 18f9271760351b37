//! Component identities and the reference hierarchy.
//!
//! A component is identified by `(kind, id)`. The kind fixes the hierarchy
//! level, the canonical id shape, and the conventional file location, so all of
//! that lives here instead of being re-derived at each validation site.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The five component kinds, declared in hierarchy order so the derived `Ord`
/// sorts by level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Mcp,
    Command,
    Skill,
    Agent,
    Workflow,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Mcp,
        ComponentKind::Command,
        ComponentKind::Skill,
        ComponentKind::Agent,
        ComponentKind::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Mcp => "mcp",
            ComponentKind::Command => "command",
            ComponentKind::Skill => "skill",
            ComponentKind::Agent => "agent",
            ComponentKind::Workflow => "workflow",
        }
    }

    /// Plural form used for registry lists, frontmatter keys, and top-level
    /// directories.
    pub fn plural(&self) -> &'static str {
        match self {
            ComponentKind::Mcp => "mcps",
            ComponentKind::Command => "commands",
            ComponentKind::Skill => "skills",
            ComponentKind::Agent => "agents",
            ComponentKind::Workflow => "workflows",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            ComponentKind::Mcp => 0,
            ComponentKind::Command => 1,
            ComponentKind::Skill => 2,
            ComponentKind::Agent => 3,
            ComponentKind::Workflow => 4,
        }
    }

    /// Whether a component of this kind may reference a component of
    /// `target`'s kind.
    ///
    /// Strictly lower levels are always allowed. Only skills may reference
    /// their own kind; mcps reference nothing, and no other kind composes
    /// with its peers.
    pub fn may_reference(&self, target: ComponentKind) -> bool {
        if target.level() < self.level() {
            return true;
        }
        target == *self && *self == ComponentKind::Skill
    }

    /// Relative location of the component file for `id`, using `/` separators.
    ///
    /// The result is only a candidate; callers must pass it through
    /// [`crate::path_resolver::resolve`] before touching the filesystem.
    pub fn relative_path(&self, id: &str) -> String {
        match self {
            ComponentKind::Mcp | ComponentKind::Agent => format!("{}/{id}.md", self.plural()),
            ComponentKind::Command => {
                let trimmed = id.strip_prefix('/').unwrap_or(id);
                format!("commands/{}.md", trimmed.replace(':', "/"))
            }
            ComponentKind::Skill => format!("skills/{id}/SKILL.md"),
            ComponentKind::Workflow => format!("workflows/{id}.md"),
        }
    }

    /// Derive an id from the path segments below the kind directory (file
    /// extension and `SKILL.md` already stripped by the caller).
    pub fn id_from_segments(&self, segments: &[&str]) -> String {
        match self {
            ComponentKind::Command => format!("/{}", segments.join(":")),
            _ => segments.join("/"),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(kind, id)` identity of a component. Orders by level, then id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ComponentKey {
    pub kind: ComponentKind,
    pub id: String,
}

impl ComponentKey {
    pub fn new(kind: ComponentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn level(&self) -> u8 {
        self.kind.level()
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A reference declared in a component's frontmatter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ComponentRef {
    pub target: ComponentKey,
    /// The string exactly as written in the source document.
    pub declared: String,
}

impl ComponentRef {
    /// Build a reference from a raw declared string. Surrounding whitespace is
    /// dropped from the target id; `declared` keeps the original text.
    pub fn parse(kind: ComponentKind, declared: &str) -> Self {
        Self {
            target: ComponentKey::new(kind, declared.trim()),
            declared: declared.to_string(),
        }
    }
}

/// Where a component identity was discovered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub registry: bool,
    pub disk: bool,
}

impl Origin {
    pub fn registry() -> Self {
        Self {
            registry: true,
            disk: false,
        }
    }

    pub fn disk() -> Self {
        Self {
            registry: false,
            disk: true,
        }
    }

    pub fn merge(&mut self, other: Origin) {
        self.registry |= other.registry;
        self.disk |= other.disk;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub key: ComponentKey,
    pub origin: Origin,
    /// File backing the component, relative to the plugin root.
    pub source_path: Option<PathBuf>,
    pub declared_refs: Vec<ComponentRef>,
    /// Frontmatter `name`, when the component was parsed from disk.
    pub declared_name: Option<String>,
    pub description: Option<String>,
    /// Set once the component file's frontmatter parsed cleanly.
    pub parsed: bool,
}

impl Component {
    pub fn from_registry(key: ComponentKey) -> Self {
        Self {
            key,
            origin: Origin::registry(),
            source_path: None,
            declared_refs: Vec::new(),
            declared_name: None,
            description: None,
            parsed: false,
        }
    }

    pub fn from_disk(key: ComponentKey, source_path: PathBuf) -> Self {
        Self {
            key,
            origin: Origin::disk(),
            source_path: Some(source_path),
            declared_refs: Vec::new(),
            declared_name: None,
            description: None,
            parsed: false,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.key.kind
    }

    pub fn level(&self) -> u8 {
        self.key.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_table_matches_levels() {
        use ComponentKind::*;
        assert!(!Mcp.may_reference(Mcp));
        assert!(Command.may_reference(Mcp));
        assert!(!Command.may_reference(Command));
        assert!(Skill.may_reference(Command));
        assert!(Skill.may_reference(Skill));
        assert!(!Skill.may_reference(Agent));
        assert!(!Agent.may_reference(Agent));
        assert!(Agent.may_reference(Mcp));
        assert!(!Agent.may_reference(Workflow));
        assert!(Workflow.may_reference(Agent));
        assert!(!Workflow.may_reference(Workflow));
    }

    #[test]
    fn relative_paths_follow_layout() {
        assert_eq!(
            ComponentKind::Command.relative_path("/dev:commit"),
            "commands/dev/commit.md"
        );
        assert_eq!(
            ComponentKind::Skill.relative_path("methodology/writing-plans"),
            "skills/methodology/writing-plans/SKILL.md"
        );
        assert_eq!(ComponentKind::Agent.relative_path("tester"), "agents/tester.md");
        assert_eq!(
            ComponentKind::Workflow.relative_path("delivery/feature"),
            "workflows/delivery/feature.md"
        );
    }

    #[test]
    fn keys_sort_by_level_then_id() {
        let mut keys = vec![
            ComponentKey::new(ComponentKind::Workflow, "a/a"),
            ComponentKey::new(ComponentKind::Mcp, "z"),
            ComponentKey::new(ComponentKind::Skill, "b/b"),
            ComponentKey::new(ComponentKind::Skill, "a/b"),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["mcp:z", "skill:a/b", "skill:b/b", "workflow:a/a"]);
    }
}
