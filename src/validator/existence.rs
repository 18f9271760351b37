//! Existence rules: dangling references and registry/filesystem drift.

use crate::component::ComponentKey;
use crate::path_resolver;
use crate::validator::Validator;
use crate::validator::format::is_well_formed;
use crate::violation::{Detail, ErrorKind, Violation};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) fn check(validator: &Validator<'_>, out: &mut Vec<Violation>) {
    missing_references(validator, out);
    orphans_in_registry(validator, out);
    orphans_on_disk(validator, out);
}

// Malformed targets are left to the format rule.
fn missing_references(validator: &Validator<'_>, out: &mut Vec<Violation>) {
    let graph = validator.graph();
    for node in graph.nodes() {
        let mut seen: BTreeSet<&ComponentKey> = BTreeSet::new();
        for reference in &node.declared_refs {
            let target = &reference.target;
            if !is_well_formed(target) || graph.contains(target) || !seen.insert(target) {
                continue;
            }
            out.push(
                Violation::new(
                    ErrorKind::MissingReference,
                    node.key.clone(),
                    format!("references {} `{}`, which does not exist", target.kind, target.id),
                )
                .with_detail(Detail::Declared(reference.declared.clone())),
            );
        }
    }
}

fn orphans_in_registry(validator: &Validator<'_>, out: &mut Vec<Violation>) {
    let root = validator.root();
    for key in validator.registry().keys() {
        let relative = key.kind.relative_path(&key.id);
        match path_resolver::resolve(root, &relative) {
            Ok(resolved) => {
                if !is_present(&resolved) {
                    out.push(
                        Violation::new(
                            ErrorKind::OrphanInRegistry,
                            key.clone(),
                            format!("declared in the registry but {relative} does not exist"),
                        )
                        .with_detail(Detail::Source(PathBuf::from(relative))),
                    );
                }
            }
            Err(err) => {
                debug!(component = %key, error = %err, "registry id rejected by path resolver");
                out.push(
                    Violation::new(
                        ErrorKind::PathSecurity,
                        key.clone(),
                        format!("registry id maps to an unsafe path: {err}"),
                    )
                    .with_detail(Detail::Declared(key.id.clone())),
                );
            }
        }
    }
}

// Symlinked files count as present; the scan reports them separately.
fn is_present(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| !meta.is_dir())
}

fn orphans_on_disk(validator: &Validator<'_>, out: &mut Vec<Violation>) {
    let registry = validator.registry();
    for node in validator.graph().nodes() {
        if !node.origin.disk || registry.contains(&node.key) {
            continue;
        }
        out.push(
            Violation::new(
                ErrorKind::OrphanOnDisk,
                node.key.clone(),
                "found on disk but not declared in the registry",
            )
            .with_detail(
                node.source_path
                    .clone()
                    .map(Detail::Source)
                    .unwrap_or(Detail::None),
            ),
        );
    }
}
