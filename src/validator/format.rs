//! Id shape checks for components and their declared references.

use crate::component::{ComponentKey, ComponentKind};
use crate::registry::Registry;
use crate::validator::Validator;
use crate::violation::{Detail, ErrorKind, Violation};
use regex::Regex;
use std::sync::OnceLock;

const COMMAND_PATTERN: &str = r"^/[a-z][a-z0-9-]*:[a-z][a-z0-9-]*$";
const CATEGORIZED_PATTERN: &str = r"^[a-z][a-z0-9-]*/[a-z][a-z0-9-]*$";
const FLAT_PATTERN: &str = r"^[a-z][a-z0-9-]*$";

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COMMAND_PATTERN).expect("valid regex"))
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn categorized_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CATEGORIZED_PATTERN).expect("valid regex"))
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn flat_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FLAT_PATTERN).expect("valid regex"))
}

fn shape(kind: ComponentKind) -> &'static Regex {
    match kind {
        ComponentKind::Command => command_regex(),
        ComponentKind::Skill | ComponentKind::Workflow => categorized_regex(),
        ComponentKind::Mcp | ComponentKind::Agent => flat_regex(),
    }
}

/// Why an id failed its shape check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatProblem {
    Traversal,
    Shape,
}

/// Check `id` against the canonical shape for `kind`.
pub fn check_id(kind: ComponentKind, id: &str) -> Result<(), FormatProblem> {
    if id.contains("..") {
        return Err(FormatProblem::Traversal);
    }
    if !shape(kind).is_match(id) {
        return Err(FormatProblem::Shape);
    }
    Ok(())
}

pub fn is_well_formed(key: &ComponentKey) -> bool {
    check_id(key.kind, &key.id).is_ok()
}

/// Namespace of a command id (`/ns:name` → `ns`).
pub fn command_namespace(id: &str) -> Option<&str> {
    id.strip_prefix('/')?
        .split_once(':')
        .map(|(namespace, _)| namespace)
}

fn describe(key: &ComponentKey, problem: FormatProblem) -> String {
    match problem {
        FormatProblem::Traversal => {
            format!("{} id `{}` contains `..`", key.kind, key.id)
        }
        FormatProblem::Shape => format!(
            "{} id `{}` does not match {}",
            key.kind,
            key.id,
            shape(key.kind).as_str()
        ),
    }
}

fn unknown_namespace(registry: &Registry, key: &ComponentKey) -> Option<String> {
    if key.kind != ComponentKind::Command || registry.command_namespaces().is_empty() {
        return None;
    }
    let namespace = command_namespace(&key.id)?;
    if registry.command_namespaces().contains(namespace) {
        return None;
    }
    Some(namespace.to_string())
}

pub(crate) fn check(validator: &Validator<'_>, out: &mut Vec<Violation>) {
    let registry = validator.registry();
    for node in validator.graph().nodes() {
        let source = node
            .source_path
            .clone()
            .map(Detail::Source)
            .unwrap_or(Detail::None);

        match check_id(node.kind(), &node.key.id) {
            Err(problem) => out.push(
                Violation::new(
                    ErrorKind::InvalidFormat,
                    node.key.clone(),
                    describe(&node.key, problem),
                )
                .with_detail(source.clone()),
            ),
            Ok(()) => {
                if let Some(namespace) = unknown_namespace(registry, &node.key) {
                    out.push(
                        Violation::new(
                            ErrorKind::UnknownNamespace,
                            node.key.clone(),
                            format!("command namespace `{namespace}` is not declared in the registry"),
                        )
                        .with_detail(source.clone()),
                    );
                }
            }
        }

        for reference in &node.declared_refs {
            let target = &reference.target;
            match check_id(target.kind, &target.id) {
                Err(problem) => out.push(
                    Violation::new(
                        ErrorKind::InvalidFormat,
                        node.key.clone(),
                        format!("invalid reference: {}", describe(target, problem)),
                    )
                    .with_detail(Detail::Declared(reference.declared.clone())),
                ),
                Ok(()) => {
                    if let Some(namespace) = unknown_namespace(registry, target) {
                        out.push(
                            Violation::new(
                                ErrorKind::UnknownNamespace,
                                node.key.clone(),
                                format!(
                                    "references command `{}` in undeclared namespace `{namespace}`",
                                    target.id
                                ),
                            )
                            .with_detail(Detail::Declared(reference.declared.clone())),
                        );
                    }
                }
            }
        }
    }
}
