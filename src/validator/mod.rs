//! Rule engine over the assembled component graph.
//!
//! Every rule runs to completion and appends to a shared list; no rule can
//! short-circuit another. The result is sorted so the report does not depend
//! on rule order.

pub mod advisory;
pub mod cycles;
pub mod existence;
pub mod format;
pub mod hierarchy;

use crate::graph::ComponentGraph;
use crate::registry::Registry;
use crate::violation::Violation;
use std::path::Path;
use tracing::{debug, info};

/// Borrowed view of everything the rules inspect.
pub struct Validator<'a> {
    root: &'a Path,
    registry: &'a Registry,
    graph: &'a ComponentGraph,
}

impl<'a> Validator<'a> {
    /// `root` must be the canonical plugin root used for the scan.
    pub fn new(root: &'a Path, registry: &'a Registry, graph: &'a ComponentGraph) -> Self {
        Self {
            root,
            registry,
            graph,
        }
    }

    pub fn root(&self) -> &Path {
        self.root
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn graph(&self) -> &ComponentGraph {
        self.graph
    }

    /// Run every rule and return the sorted, de-duplicated violations.
    pub fn run(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        let before = violations.len();
        format::check(self, &mut violations);
        debug!(rule = "format", found = violations.len() - before, "rule finished");

        let before = violations.len();
        existence::check(self, &mut violations);
        debug!(rule = "existence", found = violations.len() - before, "rule finished");

        let before = violations.len();
        hierarchy::check(self.graph, &mut violations);
        debug!(rule = "hierarchy", found = violations.len() - before, "rule finished");

        let before = violations.len();
        cycles::check(self.graph, &mut violations);
        debug!(rule = "cycles", found = violations.len() - before, "rule finished");

        let before = violations.len();
        advisory::check(self.registry, self.graph, &mut violations);
        debug!(rule = "advisory", found = violations.len() - before, "rule finished");

        sort_violations(&mut violations);
        info!(
            components = self.graph.node_count(),
            references = self.graph.edge_count(),
            violations = violations.len(),
            "validation finished"
        );
        violations
    }
}

/// Sort into report order and drop exact duplicates.
pub fn sort_violations(violations: &mut Vec<Violation>) {
    violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    violations.dedup();
}
