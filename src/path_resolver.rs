//! Confinement of untrusted path strings to a root directory.
//!
//! `resolve` is pure: it never touches the filesystem, so it cannot be raced
//! and gives the same answer for the same inputs. Callers that go on to read
//! the file are responsible for refusing symlinks (see `discovery`).

use crate::error::PathSecurityError;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

const PARENT: &str = "..";

/// Resolve `candidate` against `root`, rejecting anything that could name a
/// location outside it.
pub fn resolve(root: &Path, candidate: &str) -> Result<PathBuf, PathSecurityError> {
    if candidate.is_empty() {
        return Err(PathSecurityError::Empty);
    }
    if !root.is_absolute() {
        return Err(PathSecurityError::RelativeRoot(root.to_path_buf()));
    }
    if candidate.contains(PARENT) {
        return Err(PathSecurityError::Traversal);
    }

    let decoded = decode_once(candidate)?;
    if decoded.contains('\0') {
        return Err(PathSecurityError::NulByte);
    }
    if decoded.contains(PARENT) {
        return Err(PathSecurityError::Traversal);
    }

    let normalized = decoded.replace('\\', "/");
    let absolute = normalized.starts_with('/');
    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.is_empty() {
        return Err(PathSecurityError::Empty);
    }

    let mut resolved = if absolute {
        PathBuf::from("/")
    } else {
        root.to_path_buf()
    };
    for segment in &segments {
        resolved.push(segment);
    }

    if !is_strictly_under(root, &resolved) {
        return Err(PathSecurityError::EscapesRoot);
    }
    Ok(resolved)
}

fn decode_once(candidate: &str) -> Result<String, PathSecurityError> {
    let bytes = candidate.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let well_formed = bytes.len() > idx + 2
                && bytes[idx + 1].is_ascii_hexdigit()
                && bytes[idx + 2].is_ascii_hexdigit();
            if !well_formed {
                return Err(PathSecurityError::MalformedEscape);
            }
            idx += 3;
        } else {
            idx += 1;
        }
    }

    percent_decode_str(candidate)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| PathSecurityError::InvalidEncoding)
}

// String comparison with an explicit trailing separator so `/plugins/root-evil`
// is never accepted for root `/plugins/root`.
fn is_strictly_under(root: &Path, resolved: &Path) -> bool {
    let root_str = root.to_string_lossy();
    let trimmed = root_str.trim_end_matches('/');
    let prefix = format!("{trimmed}/");
    let resolved_str = resolved.to_string_lossy();
    resolved_str.len() > prefix.len() && resolved_str.starts_with(&prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/srv/plugin")
    }

    #[test]
    fn resolves_plain_relative_path() {
        let resolved = resolve(&root(), "agents/tester.md").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/plugin/agents/tester.md"));
    }

    #[test]
    fn rejects_literal_traversal() {
        assert_eq!(
            resolve(&root(), "../../../etc/passwd"),
            Err(PathSecurityError::Traversal)
        );
        assert_eq!(
            resolve(&root(), "agents/..\\..\\secret"),
            Err(PathSecurityError::Traversal)
        );
    }

    #[test]
    fn rejects_encoded_traversal() {
        for candidate in ["%2e%2e/etc/passwd", "%2E%2E%2Fetc", "agents/.%2e/x", "%2e./x"] {
            assert_eq!(
                resolve(&root(), candidate),
                Err(PathSecurityError::Traversal),
                "{candidate} should be rejected"
            );
        }
    }

    #[test]
    fn double_encoding_is_decoded_once() {
        let resolved = resolve(&root(), "agents/%252e%252e").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/plugin/agents/%2e%2e"));
    }

    #[test]
    fn rejects_nul_and_bad_escapes() {
        assert_eq!(
            resolve(&root(), "agents/x%00.md"),
            Err(PathSecurityError::NulByte)
        );
        assert_eq!(
            resolve(&root(), "agents/x%zz.md"),
            Err(PathSecurityError::MalformedEscape)
        );
        assert_eq!(
            resolve(&root(), "agents/x%2"),
            Err(PathSecurityError::MalformedEscape)
        );
        assert_eq!(
            resolve(&root(), "agents/%ff%fe.md"),
            Err(PathSecurityError::InvalidEncoding)
        );
    }

    #[test]
    fn rejects_absolute_paths_outside_root() {
        assert_eq!(
            resolve(&root(), "/etc/passwd"),
            Err(PathSecurityError::EscapesRoot)
        );
        assert_eq!(
            resolve(&root(), "/srv/plugin-evil/agents/x.md"),
            Err(PathSecurityError::EscapesRoot)
        );
        assert_eq!(
            resolve(&root(), "%2fetc%2fpasswd"),
            Err(PathSecurityError::EscapesRoot)
        );
    }

    #[test]
    fn accepts_absolute_path_inside_root() {
        let resolved = resolve(&root(), "/srv/plugin/agents/x.md").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/plugin/agents/x.md"));
    }

    #[test]
    fn root_itself_is_not_a_target() {
        assert_eq!(resolve(&root(), "."), Err(PathSecurityError::Empty));
        assert_eq!(resolve(&root(), ""), Err(PathSecurityError::Empty));
        assert_eq!(
            resolve(&root(), "/srv/plugin/"),
            Err(PathSecurityError::EscapesRoot)
        );
    }

    #[test]
    fn normalizes_mixed_separators() {
        let resolved = resolve(&root(), "skills\\methodology/./writing-plans//SKILL.md").unwrap();
        assert_eq!(
            resolved,
            PathBuf::from("/srv/plugin/skills/methodology/writing-plans/SKILL.md")
        );
    }

    #[test]
    fn relative_root_is_rejected() {
        assert!(matches!(
            resolve(Path::new("plugin"), "agents/x.md"),
            Err(PathSecurityError::RelativeRoot(_))
        ));
    }
}
