//! Violations produced by a validation run.

use crate::component::ComponentKey;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Broad failure class, used for summaries and by callers that only care
/// about the category of a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorClass {
    ParseError,
    PathSecurityError,
    FormatError,
    ExistenceError,
    HierarchyViolation,
    CycleDetected,
    Advisory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ParseError,
    PathSecurity,
    InvalidFormat,
    UnknownNamespace,
    MissingReference,
    OrphanInRegistry,
    OrphanOnDisk,
    HierarchyViolation,
    CycleDetected,
    DuplicateDeclaration,
    NameMismatch,
    MissingDescription,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "parse-error",
            ErrorKind::PathSecurity => "path-security",
            ErrorKind::InvalidFormat => "invalid-format",
            ErrorKind::UnknownNamespace => "unknown-namespace",
            ErrorKind::MissingReference => "missing-reference",
            ErrorKind::OrphanInRegistry => "orphan-in-registry",
            ErrorKind::OrphanOnDisk => "orphan-on-disk",
            ErrorKind::HierarchyViolation => "hierarchy-violation",
            ErrorKind::CycleDetected => "cycle-detected",
            ErrorKind::DuplicateDeclaration => "duplicate-declaration",
            ErrorKind::NameMismatch => "name-mismatch",
            ErrorKind::MissingDescription => "missing-description",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::ParseError => ErrorClass::ParseError,
            ErrorKind::PathSecurity => ErrorClass::PathSecurityError,
            ErrorKind::InvalidFormat | ErrorKind::UnknownNamespace => ErrorClass::FormatError,
            ErrorKind::MissingReference | ErrorKind::OrphanInRegistry | ErrorKind::OrphanOnDisk => {
                ErrorClass::ExistenceError
            }
            ErrorKind::HierarchyViolation => ErrorClass::HierarchyViolation,
            ErrorKind::CycleDetected => ErrorClass::CycleDetected,
            ErrorKind::DuplicateDeclaration
            | ErrorKind::NameMismatch
            | ErrorKind::MissingDescription => ErrorClass::Advisory,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.class() {
            ErrorClass::Advisory => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra context attached to a violation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Detail {
    None,
    /// File the violation was found in, relative to the plugin root.
    Source(PathBuf),
    /// A reference string exactly as declared.
    Declared(String),
    /// Components in cycle order, first node repeated at the end.
    Cycle(Vec<ComponentKey>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub severity: Severity,
    pub code: ErrorKind,
    pub subject: ComponentKey,
    pub message: String,
    pub detail: Detail,
}

impl Violation {
    /// Build a violation with the code's default severity.
    pub fn new(code: ErrorKind, subject: ComponentKey, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            subject,
            message: message.into(),
            detail: Detail::None,
        }
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Total order used to make reports independent of rule execution order.
    pub(crate) fn sort_key(&self) -> (&ComponentKey, Severity, ErrorKind, &str, &Detail) {
        (
            &self.subject,
            self.severity,
            self.code,
            self.message.as_str(),
            &self.detail,
        )
    }
}
