#![allow(dead_code)]

use anyhow::{Context, Result};
use plugin_align::{
    ComponentKind, ErrorKind, Validation, ValidateOptions, Violation, validate_with,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HEALTHY_REGISTRY: &str = r#"version: "1.0.0"
command_namespaces: [dev]
mcps: [context7]
commands: ["/dev:commit"]
skills: [methodology/writing-plans]
agents: [fullstack-developer]
workflows: [delivery/feature]
"#;

// Throwaway plugin tree rooted in a temp directory.
pub struct PluginFixture {
    dir: TempDir,
}

impl PluginFixture {
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new().context("creating fixture dir")?;
        Ok(Self { dir })
    }

    /// Fully aligned plugin: every kind present, every reference resolvable,
    /// no warnings.
    pub fn healthy() -> Result<Self> {
        let fixture = Self::empty()?;
        fixture.registry(HEALTHY_REGISTRY)?;
        fixture.component(ComponentKind::Mcp, "context7", "")?;
        fixture.component(ComponentKind::Command, "/dev:commit", "mcps: [context7]\n")?;
        fixture.component(
            ComponentKind::Skill,
            "methodology/writing-plans",
            "commands: [\"/dev:commit\"]\n",
        )?;
        fixture.component(
            ComponentKind::Agent,
            "fullstack-developer",
            "skills: [methodology/writing-plans]\nmcps: context7\n",
        )?;
        fixture.component(
            ComponentKind::Workflow,
            "delivery/feature",
            "agents:\n  - fullstack-developer\n",
        )?;
        Ok(fixture)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn registry(&self, yaml: &str) -> Result<PathBuf> {
        self.write("registry.yaml", yaml)
    }

    /// Write a component file at its conventional location with a matching
    /// `name`, a description, and `extra` appended to the frontmatter.
    pub fn component(&self, kind: ComponentKind, id: &str, extra: &str) -> Result<PathBuf> {
        let name = match kind {
            ComponentKind::Command => id.rsplit(':').next().unwrap_or(id),
            _ => id.rsplit('/').next().unwrap_or(id),
        };
        let contents =
            format!("---\nname: {name}\ndescription: Fixture {kind}\n{extra}---\n\n# {name}\n");
        self.write(&kind.relative_path(id), &contents)
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        let path = self.root().join(relative);
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))
    }

    pub fn validate(&self) -> Result<Validation> {
        self.validate_with(&ValidateOptions::default())
    }

    pub fn validate_with(&self, options: &ValidateOptions) -> Result<Validation> {
        validate_with(self.root(), options).context("validation should not abort")
    }
}

/// `(subject, code)` for every violation, in report order.
pub fn codes(validation: &Validation) -> Vec<(String, ErrorKind)> {
    validation
        .violations
        .iter()
        .map(|v| (v.subject.to_string(), v.code))
        .collect()
}

pub fn with_code(validation: &Validation, code: ErrorKind) -> Vec<&Violation> {
    validation
        .violations
        .iter()
        .filter(|v| v.code == code)
        .collect()
}

pub fn errors(validation: &Validation) -> Vec<&Violation> {
    validation.violations.iter().filter(|v| v.is_error()).collect()
}
