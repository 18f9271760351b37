//! Filesystem discovery of component files.
//!
//! Each kind directory is walked independently (optionally on its own scoped
//! thread). A walk only produces immutable `Component` records and
//! violations; nothing is shared between walks, and results are re-sorted after
//! the join so output never depends on scheduling.

use crate::component::{Component, ComponentKey, ComponentKind};
use crate::config::ValidateOptions;
use crate::error::{FrontmatterError, PathSecurityError};
use crate::frontmatter;
use crate::path_resolver;
use crate::violation::{Detail, ErrorKind, Violation};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

const SKILL_FILE: &str = "SKILL.md";
const README_FILE: &str = "README.md";

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Components found on disk, sorted by identity.
    pub components: Vec<Component>,
    pub violations: Vec<Violation>,
}

impl ScanOutcome {
    fn extend(&mut self, other: ScanOutcome) {
        self.components.extend(other.components);
        self.violations.extend(other.violations);
    }
}

/// Scan every kind directory under `root`.
///
/// `root` must already be canonical; every candidate is confined to it with
/// [`path_resolver::resolve`] before it is read.
pub fn scan(root: &Path, options: &ValidateOptions) -> ScanOutcome {
    let per_kind: Vec<ScanOutcome> = if options.parallel_scan {
        thread::scope(|scope| {
            let handles: Vec<_> = ComponentKind::ALL
                .iter()
                .map(|&kind| scope.spawn(move || scan_kind(root, kind, options)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    } else {
        ComponentKind::ALL
            .iter()
            .map(|&kind| scan_kind(root, kind, options))
            .collect()
    };

    let mut outcome = ScanOutcome::default();
    for part in per_kind {
        outcome.extend(part);
    }
    outcome.components.sort_by(|a, b| a.key.cmp(&b.key));
    outcome
        .violations
        .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    outcome
}

fn scan_kind(root: &Path, kind: ComponentKind, options: &ValidateOptions) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let kind_dir = root.join(kind.plural());
    if !kind_dir.is_dir() {
        debug!(kind = %kind, dir = %kind_dir.display(), "no component directory");
        return outcome;
    }

    let walker = WalkDir::new(&kind_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let location = err
                    .path()
                    .map(|p| relative_display(root, p))
                    .unwrap_or_else(|| kind.plural().to_string());
                warn!(kind = %kind, path = %location, error = %err, "unable to walk component directory");
                outcome.violations.push(
                    Violation::new(
                        ErrorKind::ParseError,
                        ComponentKey::new(kind, location.clone()),
                        format!("unable to read {location}: {err}"),
                    )
                    .with_detail(Detail::Source(PathBuf::from(location))),
                );
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        let Some(segments) = candidate_segments(kind, &kind_dir, entry.path()) else {
            continue;
        };
        let segment_refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        let key = ComponentKey::new(kind, kind.id_from_segments(&segment_refs));
        let relative = relative_display(root, entry.path());

        if entry.path_is_symlink() {
            outcome.violations.push(path_violation(
                key,
                &relative,
                &PathSecurityError::Symlink,
            ));
            continue;
        }

        let resolved = match path_resolver::resolve(root, &relative) {
            Ok(resolved) => resolved,
            Err(err) => {
                outcome
                    .violations
                    .push(path_violation(key, &relative, &err));
                continue;
            }
        };

        let mut component = Component::from_disk(key.clone(), PathBuf::from(&relative));
        match read_frontmatter(&resolved, options) {
            Ok(fm) => {
                debug!(component = %key, references = fm.references.len(), "scanned component");
                component.declared_refs = fm.references;
                component.declared_name = fm.name;
                component.description = fm.description;
                component.parsed = true;
            }
            Err(err) => {
                warn!(component = %key, path = %relative, error = %err, "unable to parse frontmatter");
                outcome.violations.push(
                    Violation::new(
                        ErrorKind::ParseError,
                        key,
                        format!("{relative}: {err}"),
                    )
                    .with_detail(Detail::Source(PathBuf::from(&relative))),
                );
            }
        }
        outcome.components.push(component);
    }

    info!(kind = %kind, components = outcome.components.len(), "scanned kind directory");
    outcome
}

/// Path segments below the kind directory that make up the component id, or
/// `None` when the file is not a component file for `kind`.
fn candidate_segments(kind: ComponentKind, kind_dir: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(kind_dir).ok()?;
    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let file_name = segments.pop()?;

    match kind {
        ComponentKind::Skill => {
            if file_name != SKILL_FILE || segments.is_empty() {
                return None;
            }
        }
        _ => {
            if file_name == README_FILE {
                return None;
            }
            let stem = file_name.strip_suffix(".md")?;
            if stem.is_empty() {
                return None;
            }
            segments.push(stem.to_string());
        }
    }
    Some(segments)
}

fn read_frontmatter(
    path: &Path,
    options: &ValidateOptions,
) -> Result<frontmatter::Frontmatter, FrontmatterError> {
    let size = fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|err| FrontmatterError::Io(err.to_string()))?;
    if size > options.max_file_bytes {
        return Err(FrontmatterError::TooLarge {
            size,
            limit: options.max_file_bytes,
        });
    }
    let content = fs::read_to_string(path)
        .map_err(|err| FrontmatterError::Io(err.to_string()))?;
    frontmatter::parse(&content, &options.yaml_limits)
}

fn path_violation(key: ComponentKey, relative: &str, err: &PathSecurityError) -> Violation {
    Violation::new(ErrorKind::PathSecurity, key, format!("{relative}: {err}"))
        .with_detail(Detail::Source(PathBuf::from(relative)))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

// Root-relative path with `/` separators.
fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
