//! Plugin root detection.
//!
//! `build.rs` compiles this file too, to vet `PLUGIN_ALIGN_ROOT_HINT` before
//! embedding it, so it depends on `std` alone.

use std::fs;
use std::path::{Path, PathBuf};

/// File whose presence marks a directory as a plugin root.
pub const REGISTRY_FILE: &str = "registry.yaml";

pub fn is_plugin_root(candidate: &Path) -> bool {
    candidate.join(REGISTRY_FILE).is_file()
}

/// Canonical form of `raw` when it names an existing directory.
pub fn existing_dir(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }
    let path = PathBuf::from(raw);
    if !path.is_dir() {
        return None;
    }
    fs::canonicalize(path).ok()
}

/// Canonical form of `raw` when it names a directory holding a registry.
pub fn root_from_hint(raw: &str) -> Option<PathBuf> {
    existing_dir(raw).filter(|dir| is_plugin_root(dir))
}

/// Nearest ancestor of `start`, itself included, that holds a registry.
pub fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_plugin_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}
