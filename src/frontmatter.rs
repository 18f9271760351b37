//! Leading metadata block of a component file.
//!
//! The block is delimited by `---` lines at the very start of the file and is
//! decoded with the restricted YAML schema from [`crate::safe_yaml`]. Only the
//! keys that matter for alignment are typed; everything else in the block is
//! ignored.

use crate::component::{ComponentKind, ComponentRef};
use crate::error::FrontmatterError;
use crate::safe_yaml::{YamlLimits, parse_restricted};
use serde::Deserialize;
use serde_json::Value;

/// Typed view of a component's frontmatter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Declared references in document order, grouped by target kind.
    pub references: Vec<ComponentRef>,
    /// 1-based line number of the closing delimiter.
    pub end_line: u32,
}

#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    mcps: Option<StringList>,
    #[serde(default)]
    commands: Option<StringList>,
    #[serde(default)]
    skills: Option<StringList>,
    #[serde(default)]
    agents: Option<StringList>,
    #[serde(default)]
    workflows: Option<StringList>,
}

impl RawFrontmatter {
    fn list(&self, kind: ComponentKind) -> Vec<&str> {
        let list = match kind {
            ComponentKind::Mcp => &self.mcps,
            ComponentKind::Command => &self.commands,
            ComponentKind::Skill => &self.skills,
            ComponentKind::Agent => &self.agents,
            ComponentKind::Workflow => &self.workflows,
        };
        list.as_ref().map(StringList::items).unwrap_or_default()
    }
}

/// Either a YAML sequence of strings or one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    Many(Vec<String>),
    One(String),
}

impl StringList {
    fn items(&self) -> Vec<&str> {
        match self {
            StringList::Many(items) => items.iter().map(String::as_str).collect(),
            StringList::One(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Split `content` into the raw frontmatter text and the closing line number.
pub fn extract_block(content: &str) -> Result<(String, u32), FrontmatterError> {
    let mut lines = content.lines();

    let first = lines
        .next()
        .ok_or(FrontmatterError::NoFrontmatter)?
        .trim_start_matches('\u{feff}')
        .trim_end();
    if first != "---" {
        return Err(FrontmatterError::NoFrontmatter);
    }

    let mut yaml_lines: Vec<&str> = Vec::new();
    let mut end_line: u32 = 1;
    for line in lines {
        end_line += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Ok((yaml_lines.join("\n"), end_line));
        }
        yaml_lines.push(line);
    }
    Err(FrontmatterError::Unterminated)
}

/// Parse the frontmatter of a component file.
///
/// An empty block is valid and declares nothing.
pub fn parse(content: &str, limits: &YamlLimits) -> Result<Frontmatter, FrontmatterError> {
    let (block, end_line) = extract_block(content)?;
    let value = parse_restricted(&block, limits)?;
    let raw: RawFrontmatter = match value {
        Value::Null => RawFrontmatter::default(),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|err| FrontmatterError::Schema(err.to_string()))?,
        other => {
            return Err(FrontmatterError::Schema(format!(
                "expected a mapping, found {}",
                value_kind(&other)
            )));
        }
    };

    let mut references = Vec::new();
    for kind in ComponentKind::ALL {
        for declared in raw.list(kind) {
            references.push(ComponentRef::parse(kind, declared));
        }
    }

    Ok(Frontmatter {
        name: raw.name,
        description: raw.description.filter(|d| !d.trim().is_empty()),
        references,
        end_line,
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKey;
    use crate::error::YamlError;

    fn parse_default(content: &str) -> Result<Frontmatter, FrontmatterError> {
        parse(content, &YamlLimits::default())
    }

    #[test]
    fn parses_references_by_kind() {
        let content = "---\nname: fullstack-developer\ndescription: Builds things\nskills:\n  - frameworks/react\n  - methodology/writing-plans\nmcps: [context7]\ntools: Read, Write\n---\n# Body\n";
        let fm = parse_default(content).unwrap();
        assert_eq!(fm.name.as_deref(), Some("fullstack-developer"));
        assert_eq!(fm.description.as_deref(), Some("Builds things"));
        assert_eq!(fm.end_line, 9);
        let targets: Vec<ComponentKey> = fm.references.iter().map(|r| r.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                ComponentKey::new(ComponentKind::Mcp, "context7"),
                ComponentKey::new(ComponentKind::Skill, "frameworks/react"),
                ComponentKey::new(ComponentKind::Skill, "methodology/writing-plans"),
            ]
        );
    }

    #[test]
    fn comma_separated_lists_are_split() {
        let fm = parse_default("---\ncommands: \"/dev:commit, /git:sync\"\n---\n").unwrap();
        let declared: Vec<&str> = fm.references.iter().map(|r| r.declared.as_str()).collect();
        assert_eq!(declared, ["/dev:commit", "/git:sync"]);
    }

    #[test]
    fn tolerates_bom_and_dot_terminator() {
        let fm = parse_default("\u{feff}---\nname: x\n...\nbody").unwrap();
        assert_eq!(fm.name.as_deref(), Some("x"));
    }

    #[test]
    fn missing_block_is_reported() {
        assert_eq!(
            parse_default("# Title\nBody").unwrap_err(),
            FrontmatterError::NoFrontmatter
        );
        assert_eq!(parse_default("").unwrap_err(), FrontmatterError::NoFrontmatter);
    }

    #[test]
    fn unterminated_block_is_reported() {
        assert_eq!(
            parse_default("---\nname: x\n# Body").unwrap_err(),
            FrontmatterError::Unterminated
        );
    }

    #[test]
    fn empty_reference_key_is_allowed() {
        let fm = parse_default("---\nskills:\nagents: []\n---\n").unwrap();
        assert!(fm.references.is_empty());
    }

    #[test]
    fn empty_block_declares_nothing() {
        let fm = parse_default("---\n---\nbody").unwrap();
        assert!(fm.references.is_empty());
        assert_eq!(fm.name, None);
    }

    #[test]
    fn schema_mismatch_is_a_parse_error() {
        assert!(matches!(
            parse_default("---\nskills: 3\n---\n"),
            Err(FrontmatterError::Schema(_))
        ));
        assert!(matches!(
            parse_default("---\n- a\n- b\n---\n"),
            Err(FrontmatterError::Schema(_))
        ));
    }

    #[test]
    fn tags_in_frontmatter_are_rejected() {
        let err = parse_default("---\nname: !!python/name:os.system\n---\n").unwrap_err();
        assert!(matches!(
            err,
            FrontmatterError::Yaml(YamlError::ForbiddenTag { .. })
        ));
    }
}
