// Path confinement over a corpus of hostile and benign candidates.
use plugin_align::PathSecurityError;
use plugin_align::path_resolver::resolve;
use std::path::{Path, PathBuf};

const ROOT: &str = "/srv/plugin";

const HOSTILE: &[&str] = &[
    "../../../etc/passwd",
    "agents/../../etc/passwd",
    "..",
    "..\\..\\windows\\system32",
    "%2e%2e/%2e%2e/etc/passwd",
    "%2E%2E%2Fetc%2Fpasswd",
    "agents/%2e%2e/%2e%2e/secret",
    ".%2e/escape",
    "agents/tester.md%00.png",
    "%",
    "%zz/agents",
    "agents/%e9.md",
    "/etc/passwd",
    "/srv/plugin-evil/agents/x.md",
    "/srv/plugin",
    "",
    "./",
    "//",
];

#[test]
fn hostile_candidates_are_rejected() {
    let root = Path::new(ROOT);
    for candidate in HOSTILE {
        let result = resolve(root, candidate);
        assert!(result.is_err(), "{candidate:?} resolved to {result:?}");
    }
}

#[test]
fn successful_resolutions_stay_under_root() {
    let root = Path::new(ROOT);
    let benign = [
        "agents/tester.md",
        "./agents/tester.md",
        "skills/methodology/writing-plans/SKILL.md",
        "commands\\dev\\commit.md",
        "agents//tester.md",
        "agents/%74ester.md",
        "/srv/plugin/mcps/context7.md",
        "%252e%252e/literal",
    ];
    for candidate in benign {
        let resolved = resolve(root, candidate)
            .unwrap_or_else(|err| panic!("{candidate:?} rejected: {err}"));
        assert!(resolved.starts_with(root), "{candidate:?} -> {resolved:?}");
        assert_ne!(resolved, PathBuf::from(ROOT));
    }
}

#[test]
fn documented_scenarios() {
    let root = Path::new(ROOT);
    assert_eq!(
        resolve(root, "../../../etc/passwd"),
        Err(PathSecurityError::Traversal)
    );
    assert_eq!(
        resolve(root, "agents/tester.md"),
        Ok(PathBuf::from("/srv/plugin/agents/tester.md"))
    );
    // Decoding happens exactly once.
    assert_eq!(
        resolve(root, "%252e%252e/literal"),
        Ok(PathBuf::from("/srv/plugin/%2e%2e/literal"))
    );
    assert_eq!(
        resolve(Path::new("relative/root"), "agents/tester.md"),
        Err(PathSecurityError::RelativeRoot(PathBuf::from("relative/root")))
    );
}
