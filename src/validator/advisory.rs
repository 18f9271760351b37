//! Warnings that never fail a run.

use crate::component::{ComponentKey, ComponentKind};
use crate::graph::ComponentGraph;
use crate::registry::Registry;
use crate::violation::{Detail, ErrorKind, Violation};

pub(crate) fn check(registry: &Registry, graph: &ComponentGraph, out: &mut Vec<Violation>) {
    for (key, count) in registry.duplicates() {
        out.push(
            Violation::new(
                ErrorKind::DuplicateDeclaration,
                key.clone(),
                format!("declared {count} times in the registry"),
            )
            .with_detail(Detail::Source(registry.path().to_path_buf())),
        );
    }

    // Files that failed to parse already carry a parse error.
    for node in graph.nodes().filter(|node| node.origin.disk && node.parsed) {
        let source = node
            .source_path
            .clone()
            .map(Detail::Source)
            .unwrap_or(Detail::None);

        if let Some(name) = node.declared_name.as_deref() {
            let expected = short_name(&node.key);
            if name.trim() != expected {
                out.push(
                    Violation::new(
                        ErrorKind::NameMismatch,
                        node.key.clone(),
                        format!("frontmatter name `{name}` does not match `{expected}`"),
                    )
                    .with_detail(source.clone()),
                );
            }
        }

        if node.description.is_none() {
            out.push(
                Violation::new(ErrorKind::MissingDescription, node.key.clone(), "no description")
                    .with_detail(source),
            );
        }
    }
}

/// Last segment of an id: the command name or the final `/` segment.
pub fn short_name(key: &ComponentKey) -> &str {
    let id = key.id.as_str();
    match key.kind {
        ComponentKind::Command => id.rsplit(':').next().unwrap_or(id),
        _ => id.rsplit('/').next().unwrap_or(id),
    }
}
