//! In-memory component graph.
//!
//! Nodes live in an arena addressed by dense [`NodeId`]s; a `BTreeMap` maps
//! identities to ids so every iteration is in `(kind, id)` order. Edges are
//! the forward references only. Reverse lookups are derived separately by
//! [`crate::reverse_index::ReverseIndex`].

use crate::component::{Component, ComponentKey};
use std::collections::{BTreeMap, BTreeSet};

/// Dense index of a node in the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Default, Clone)]
pub struct ComponentGraph {
    arena: Vec<Component>,
    index: BTreeMap<ComponentKey, NodeId>,
    edges: BTreeMap<ComponentKey, BTreeSet<ComponentKey>>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component, merging with an existing node of the same identity.
    ///
    /// Merging unions the origin flags, keeps the first known source path and
    /// frontmatter fields, and appends references not already declared.
    pub fn add_node(&mut self, component: Component) -> NodeId {
        if let Some(&id) = self.index.get(&component.key) {
            let existing = &mut self.arena[id.0];
            existing.origin.merge(component.origin);
            existing.parsed |= component.parsed;
            if existing.source_path.is_none() {
                existing.source_path = component.source_path;
            }
            if existing.declared_name.is_none() {
                existing.declared_name = component.declared_name;
            }
            if existing.description.is_none() {
                existing.description = component.description;
            }
            for reference in component.declared_refs {
                if !existing.declared_refs.contains(&reference) {
                    existing.declared_refs.push(reference);
                }
            }
            return id;
        }

        let id = NodeId(self.arena.len());
        self.index.insert(component.key.clone(), id);
        self.arena.push(component);
        id
    }

    /// Record `from → to`. Returns `false` when the edge already existed.
    ///
    /// `to` does not have to be a node; dangling edges are what the existence
    /// rule reports.
    pub fn add_edge(&mut self, from: &ComponentKey, to: &ComponentKey) -> bool {
        self.edges
            .entry(from.clone())
            .or_default()
            .insert(to.clone())
    }

    /// Add an edge for every reference declared by every node.
    pub fn connect_declared_refs(&mut self) {
        let pending: Vec<(ComponentKey, ComponentKey)> = self
            .arena
            .iter()
            .flat_map(|node| {
                node.declared_refs
                    .iter()
                    .map(move |reference| (node.key.clone(), reference.target.clone()))
            })
            .collect();
        for (from, to) in pending {
            self.add_edge(&from, &to);
        }
    }

    /// Nodes in `(kind, id)` order.
    pub fn nodes(&self) -> impl Iterator<Item = &Component> {
        self.index.values().map(|id| &self.arena[id.0])
    }

    /// Edges in `(from, to)` order.
    pub fn edges(&self) -> impl Iterator<Item = (&ComponentKey, &ComponentKey)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    /// Edges whose target exists and whose direction the hierarchy permits.
    ///
    /// This is the edge set cycle detection and the reverse index run over.
    pub fn admissible_edges(&self) -> impl Iterator<Item = (&ComponentKey, &ComponentKey)> {
        self.edges()
            .filter(|(from, to)| self.contains(to) && from.kind.may_reference(to.kind))
    }

    pub fn node(&self, key: &ComponentKey) -> Option<&Component> {
        self.index.get(key).map(|id| &self.arena[id.0])
    }

    pub fn node_id(&self, key: &ComponentKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn by_id(&self, id: NodeId) -> &Component {
        &self.arena[id.0]
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentRef, Origin};
    use std::path::PathBuf;

    fn key(kind: ComponentKind, id: &str) -> ComponentKey {
        ComponentKey::new(kind, id)
    }

    #[test]
    fn add_node_merges_by_identity() {
        let mut graph = ComponentGraph::new();
        let agent = key(ComponentKind::Agent, "tester");
        let first = graph.add_node(Component::from_registry(agent.clone()));

        let mut from_disk = Component::from_disk(agent.clone(), PathBuf::from("agents/tester.md"));
        from_disk
            .declared_refs
            .push(ComponentRef::parse(ComponentKind::Mcp, "context7"));
        let second = graph.add_node(from_disk.clone());
        let third = graph.add_node(from_disk);

        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(graph.node_count(), 1);
        let node = graph.node(&agent).unwrap();
        assert_eq!(
            node.origin,
            Origin {
                registry: true,
                disk: true
            }
        );
        assert_eq!(node.source_path, Some(PathBuf::from("agents/tester.md")));
        assert_eq!(node.declared_refs.len(), 1);
    }

    #[test]
    fn add_edge_deduplicates() {
        let mut graph = ComponentGraph::new();
        let from = key(ComponentKind::Skill, "a/a");
        let to = key(ComponentKind::Command, "/dev:x");
        assert!(graph.add_edge(&from, &to));
        assert!(!graph.add_edge(&from, &to));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn admissible_edges_skip_dangling_and_upward_edges() {
        let mut graph = ComponentGraph::new();
        let skill = key(ComponentKind::Skill, "a/a");
        let command = key(ComponentKind::Command, "/dev:x");
        let agent = key(ComponentKind::Agent, "tester");
        let missing = key(ComponentKind::Mcp, "ghost");
        for k in [&skill, &command, &agent] {
            graph.add_node(Component::from_registry(k.clone()));
        }
        graph.add_edge(&skill, &command);
        graph.add_edge(&skill, &agent);
        graph.add_edge(&skill, &missing);

        let admissible: Vec<_> = graph.admissible_edges().collect();
        assert_eq!(admissible, vec![(&skill, &command)]);
        assert_eq!(graph.edges().count(), 3);
    }
}
