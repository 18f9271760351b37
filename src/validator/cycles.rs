//! Reference cycle detection.
//!
//! Iterative three-color DFS over the admissible edges. Nodes are visited in
//! `(kind, id)` order and children in target order, so the set of reported
//! cycles is stable across runs.

use crate::component::ComponentKey;
use crate::graph::{ComponentGraph, NodeId};
use crate::violation::{Detail, ErrorKind, Violation};
use std::collections::BTreeSet;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Every distinct cycle found by the DFS, each rotated to start at its
/// smallest key and closed by repeating that key (`[A, B, A]`).
pub fn find_cycles(graph: &ComponentGraph) -> Vec<Vec<ComponentKey>> {
    let count = graph.node_count();
    let mut adjacency: Vec<Vec<NodeId>> = vec![Vec::new(); count];
    for (from, to) in graph.admissible_edges() {
        if let (Some(from), Some(to)) = (graph.node_id(from), graph.node_id(to)) {
            adjacency[from.0].push(to);
        }
    }

    let order: Vec<NodeId> = graph
        .nodes()
        .filter_map(|node| graph.node_id(&node.key))
        .collect();
    let mut color = vec![Color::White; count];
    let mut found: BTreeSet<Vec<NodeId>> = BTreeSet::new();
    let mut cycles = Vec::new();

    for start in order {
        if color[start.0] != Color::White {
            continue;
        }
        // (node, index of the next child to visit)
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
        color[start.0] = Color::Gray;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&child) = adjacency[node.0].get(frame.1) else {
                color[node.0] = Color::Black;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match color[child.0] {
                Color::White => {
                    color[child.0] = Color::Gray;
                    stack.push((child, 0));
                }
                Color::Gray => {
                    let Some(begin) = stack.iter().position(|(id, _)| *id == child) else {
                        continue;
                    };
                    let members: Vec<NodeId> = stack[begin..].iter().map(|(id, _)| *id).collect();
                    let canonical = canonical_rotation(graph, members);
                    if found.insert(canonical.clone()) {
                        let mut path: Vec<ComponentKey> = canonical
                            .iter()
                            .map(|id| graph.by_id(*id).key.clone())
                            .collect();
                        path.push(path[0].clone());
                        cycles.push(path);
                    }
                }
                Color::Black => {}
            }
        }
    }
    cycles
}

// Rotate so the member with the smallest key comes first.
fn canonical_rotation(graph: &ComponentGraph, mut members: Vec<NodeId>) -> Vec<NodeId> {
    let first = members
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| graph.by_id(**a).key.cmp(&graph.by_id(**b).key))
        .map(|(index, _)| index)
        .unwrap_or(0);
    members.rotate_left(first);
    members
}

pub(crate) fn check(graph: &ComponentGraph, out: &mut Vec<Violation>) {
    for cycle in find_cycles(graph) {
        let rendered = cycle
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        let message = if cycle.len() == 2 {
            format!("references itself: {rendered}")
        } else {
            format!("reference cycle: {rendered}")
        };
        out.push(
            Violation::new(ErrorKind::CycleDetected, cycle[0].clone(), message)
                .with_detail(Detail::Cycle(cycle)),
        );
    }
}
