//! Rendering of validation results.
//!
//! Text output groups violations under their subject in `(kind, id)` order
//! and ends with a one-line summary. JSON output carries the same violations
//! plus the reverse index.

use crate::component::ComponentKey;
use crate::reverse_index::ReverseIndex;
use crate::validator::sort_violations;
use crate::violation::{Detail, Violation};
use serde_json::{Value, json};
use std::fmt::Write as _;

#[derive(Clone, Debug)]
pub struct Report {
    violations: Vec<Violation>,
    errors: usize,
    warnings: usize,
}

impl Report {
    pub fn new(mut violations: Vec<Violation>) -> Self {
        sort_violations(&mut violations);
        let errors = violations.iter().filter(|v| v.is_error()).count();
        let warnings = violations.len() - errors;
        Self {
            violations,
            errors,
            warnings,
        }
    }

    /// `1` when any error-severity violation is present, otherwise `0`.
    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 { 1 } else { 0 }
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn summary(&self) -> String {
        format!(
            "{}, {}",
            plural(self.errors, "error"),
            plural(self.warnings, "warning")
        )
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut current: Option<&ComponentKey> = None;
        for violation in &self.violations {
            if current != Some(&violation.subject) {
                if current.is_some() {
                    out.push('\n');
                }
                let _ = writeln!(out, "{}", violation.subject);
                current = Some(&violation.subject);
            }
            let _ = writeln!(
                out,
                "  {}[{}] {}",
                violation.severity.as_str(),
                violation.code,
                violation.message
            );
            if let Some(detail) = render_detail(&violation.detail) {
                let _ = writeln!(out, "    {detail}");
            }
        }
        if !self.violations.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", self.summary());
        out
    }

    /// `text()` followed by the reverse index.
    pub fn text_with_used_by(&self, index: &ReverseIndex) -> String {
        let mut out = self.text();
        out.push_str("\nused by:\n");
        if index.is_empty() {
            out.push_str("  (no references)\n");
        }
        for (target, referrers) in index.iter() {
            let _ = writeln!(out, "  {target}");
            for referrer in referrers {
                let _ = writeln!(out, "    <- {referrer}");
            }
        }
        out
    }

    pub fn to_json(&self, index: &ReverseIndex) -> Value {
        json!({
            "ok": self.is_clean(),
            "errors": self.errors,
            "warnings": self.warnings,
            "violations": self.violations,
            "used_by": index,
        })
    }
}

fn render_detail(detail: &Detail) -> Option<String> {
    match detail {
        Detail::None => None,
        Detail::Source(path) => Some(format!("source: {}", path.display())),
        Detail::Declared(declared) => Some(format!("declared: {declared:?}")),
        Detail::Cycle(path) => Some(format!(
            "cycle: {}",
            path.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        )),
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
