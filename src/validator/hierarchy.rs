use crate::graph::ComponentGraph;
use crate::violation::{Detail, ErrorKind, Violation};

/// Report every edge that points at a kind the referrer may not use.
///
/// Runs over all edges, dangling ones included.
pub(crate) fn check(graph: &ComponentGraph, out: &mut Vec<Violation>) {
    for (from, to) in graph.edges() {
        if from.kind.may_reference(to.kind) {
            continue;
        }
        let declared = graph
            .node(from)
            .and_then(|node| {
                node.declared_refs
                    .iter()
                    .find(|reference| &reference.target == to)
            })
            .map(|reference| reference.declared.clone())
            .unwrap_or_else(|| to.id.clone());
        out.push(
            Violation::new(
                ErrorKind::HierarchyViolation,
                from.clone(),
                format!(
                    "{} (level {}) may not reference {} `{}` (level {})",
                    from.kind,
                    from.level(),
                    to.kind,
                    to.id,
                    to.level()
                ),
            )
            .with_detail(Detail::Declared(declared)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentKey, ComponentKind};

    #[test]
    fn peer_workflows_are_rejected_but_peer_skills_are_not() {
        let mut graph = ComponentGraph::new();
        let a = ComponentKey::new(ComponentKind::Workflow, "delivery/a");
        let b = ComponentKey::new(ComponentKind::Workflow, "delivery/b");
        let s1 = ComponentKey::new(ComponentKind::Skill, "x/one");
        let s2 = ComponentKey::new(ComponentKind::Skill, "x/two");
        for key in [&a, &b, &s1, &s2] {
            graph.add_node(Component::from_registry(key.clone()));
        }
        graph.add_edge(&a, &b);
        graph.add_edge(&s1, &s2);

        let mut out = Vec::new();
        check(&graph, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].subject, a);
        assert_eq!(out[0].code, ErrorKind::HierarchyViolation);
    }

    #[test]
    fn peer_agents_are_rejected() {
        let mut graph = ComponentGraph::new();
        let lead = ComponentKey::new(ComponentKind::Agent, "lead");
        let helper = ComponentKey::new(ComponentKind::Agent, "helper");
        for key in [&lead, &helper] {
            graph.add_node(Component::from_registry(key.clone()));
        }
        graph.add_edge(&lead, &helper);

        let mut out = Vec::new();
        check(&graph, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].subject, lead);
        assert_eq!(out[0].code, ErrorKind::HierarchyViolation);
    }

    #[test]
    fn dangling_upward_edges_are_still_reported() {
        let mut graph = ComponentGraph::new();
        let mcp = ComponentKey::new(ComponentKind::Mcp, "context7");
        graph.add_node(Component::from_registry(mcp.clone()));
        graph.add_edge(&mcp, &ComponentKey::new(ComponentKind::Agent, "ghost"));

        let mut out = Vec::new();
        check(&graph, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("agent `ghost`"));
    }
}
