//! Boundary-respecting subgraph extraction.
//!
//! Grouping an anchor into a subflow must not reach into structures the user
//! has already grouped elsewhere, so the traversal stops at any node held by a
//! foreign container.

use std::collections::{HashSet, VecDeque};

use crate::geometry::index_nodes;
use crate::model::{Edge, Node};

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Nodes reachable from the anchor, in discovery order. The anchor itself
    /// is the traversal root and is not listed here.
    pub child_nodes: Vec<Node>,
    /// Edges with both endpoints inside the extracted set (anchor included).
    pub child_edges: Vec<Edge>,
}

/// Breadth-first walk from `anchor_id` over outgoing edges. A reached node
/// joins the result unless it already lives in a container other than the
/// anchor's own; edges survive only when both endpoints are in the set.
///
/// Traversal follows the snapshot's edge order, so repeated calls on an
/// unchanged graph return identical results.
pub fn extract_subgraph(anchor_id: &str, nodes: &[Node], edges: &[Edge]) -> Extraction {
    let by_id = index_nodes(nodes);
    let Some(anchor) = by_id.get(anchor_id).copied() else {
        return Extraction::default();
    };
    let home = anchor.parent.as_deref();

    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(anchor_id);
    let mut members: Vec<&Node> = Vec::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(anchor_id);

    while let Some(current) = queue.pop_front() {
        for edge in edges.iter().filter(|edge| edge.source == current) {
            let target = edge.target.as_str();
            if seen.contains(target) {
                continue;
            }
            let Some(node) = by_id.get(target).copied() else {
                continue;
            };
            if node.parent.is_some() && node.parent.as_deref() != home {
                continue;
            }
            seen.insert(target);
            members.push(node);
            queue.push_back(target);
        }
    }

    let child_edges = edges
        .iter()
        .filter(|edge| seen.contains(edge.source.as_str()) && seen.contains(edge.target.as_str()))
        .cloned()
        .collect();

    Extraction {
        child_nodes: members.into_iter().cloned().collect(),
        child_edges,
    }
}
