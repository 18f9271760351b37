//! `used_by` index: who references each component.

use crate::component::ComponentKey;
use crate::graph::ComponentGraph;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Inverse of the admissible edge set. Only referenced components are keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    used_by: BTreeMap<ComponentKey, BTreeSet<ComponentKey>>,
}

impl ReverseIndex {
    /// Recompute the index from scratch.
    pub fn build(graph: &ComponentGraph) -> Self {
        let mut used_by: BTreeMap<ComponentKey, BTreeSet<ComponentKey>> = BTreeMap::new();
        for (from, to) in graph.admissible_edges() {
            used_by.entry(to.clone()).or_default().insert(from.clone());
        }
        Self { used_by }
    }

    /// Components that reference `key`, or `None` when nothing does.
    pub fn used_by(&self, key: &ComponentKey) -> Option<&BTreeSet<ComponentKey>> {
        self.used_by.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ComponentKey, &BTreeSet<ComponentKey>)> {
        self.used_by.iter()
    }

    /// Number of `(referrer, target)` pairs; equals the admissible edge count.
    pub fn pair_count(&self) -> usize {
        self.used_by.values().map(BTreeSet::len).sum()
    }

    pub fn len(&self) -> usize {
        self.used_by.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used_by.is_empty()
    }
}

// Rendered as `{"kind:id": ["kind:id", ...]}`.
impl Serialize for ReverseIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.used_by.iter().map(|(target, referrers)| {
            (
                target.to_string(),
                referrers.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentKind};

    #[test]
    fn inverts_admissible_edges_only() {
        let mut graph = ComponentGraph::new();
        let agent = ComponentKey::new(ComponentKind::Agent, "tester");
        let skill = ComponentKey::new(ComponentKind::Skill, "qa/checks");
        let workflow = ComponentKey::new(ComponentKind::Workflow, "d/ship");
        for key in [&agent, &skill, &workflow] {
            graph.add_node(Component::from_registry(key.clone()));
        }
        graph.add_edge(&agent, &skill);
        graph.add_edge(&workflow, &agent);
        graph.add_edge(&workflow, &skill);
        // upward, not admissible
        graph.add_edge(&skill, &agent);
        graph.add_edge(&agent, &ComponentKey::new(ComponentKind::Mcp, "ghost"));

        let index = ReverseIndex::build(&graph);
        assert_eq!(index.len(), 2);
        assert_eq!(index.pair_count(), graph.admissible_edges().count());
        let users: Vec<_> = index.used_by(&skill).unwrap().iter().cloned().collect();
        assert_eq!(users, vec![agent.clone(), workflow.clone()]);
        assert!(index.used_by(&workflow).is_none());

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["agent:tester"], serde_json::json!(["workflow:d/ship"]));
    }
}
