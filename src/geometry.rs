//! Containment and geometry resolution over the parent-container relation.
//!
//! Every chain walk here carries a visited-set guard: a snapshot that arrives
//! with a cyclic or dangling parent chain must still resolve to something
//! finite, and `sanitize_parenting` is the pass that repairs such snapshots.

use std::collections::{HashMap, HashSet};

use crate::config::CanvasConfig;
use crate::model::{Node, Point, Size};

pub type NodeIndex<'a> = HashMap<&'a str, &'a Node>;

pub fn index_nodes(nodes: &[Node]) -> NodeIndex<'_> {
    nodes.iter().map(|node| (node.id.as_str(), node)).collect()
}

/// Canvas-absolute position of a node: its own relative position plus the
/// relative positions of every ancestor container. A dangling parent or a
/// revisited id ends the walk with the partial sum accumulated so far.
pub fn absolute_position(node: &Node, by_id: &NodeIndex) -> Point {
    let mut x = node.position.x;
    let mut y = node.position.y;
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(node.id.as_str());
    let mut current = node.parent.as_deref();
    while let Some(parent_id) = current {
        if !visited.insert(parent_id) {
            break;
        }
        let Some(parent) = by_id.get(parent_id) else {
            break;
        };
        x += parent.position.x;
        y += parent.position.y;
        current = parent.parent.as_deref();
    }
    Point { x, y }
}

/// Explicit size when present, otherwise the per-kind default. Containers
/// default to a larger footprint than leaf nodes.
pub fn effective_size(node: &Node, config: &CanvasConfig) -> Size {
    if let Some(size) = node.size {
        return size;
    }
    if node.kind().is_container() {
        config.container_size
    } else {
        config.leaf_size
    }
}

/// True iff assigning `proposed_parent_id` as the parent of `child_id` would
/// close a containment cycle, i.e. the proposed parent is the child itself or
/// one of its descendants in the current parent graph.
pub fn would_create_cycle(child_id: &str, proposed_parent_id: &str, by_id: &NodeIndex) -> bool {
    if child_id == proposed_parent_id {
        return true;
    }
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(proposed_parent_id);
    while let Some(id) = current {
        if id == child_id {
            return true;
        }
        if !visited.insert(id) {
            // pre-existing cycle above the proposed parent, not through the child
            return false;
        }
        current = by_id.get(id).and_then(|node| node.parent.as_deref());
    }
    false
}

/// True iff the node resolves inside `container_id` through its parent chain.
pub fn is_inside(node: &Node, container_id: &str, by_id: &NodeIndex) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(node.id.as_str());
    let mut current = node.parent.as_deref();
    while let Some(id) = current {
        if id == container_id {
            return true;
        }
        if !visited.insert(id) {
            break;
        }
        current = by_id.get(id).and_then(|n| n.parent.as_deref());
    }
    false
}

/// Repair pass run after every bulk edit: any parent reference that points at
/// a missing node, a non-container node, the node itself, or that closes a
/// cycle is cleared, detaching the node to canvas root. The parent graph is
/// acyclic on return.
pub fn sanitize_parenting(mut nodes: Vec<Node>) -> Vec<Node> {
    let parents: HashMap<String, Option<String>> = nodes
        .iter()
        .map(|node| (node.id.clone(), node.parent.clone()))
        .collect();
    let container: HashMap<&str, bool> = nodes
        .iter()
        .map(|node| (node.id.as_str(), node.kind().is_container()))
        .collect();

    let mut cleared: Vec<usize> = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        let Some(parent_id) = node.parent.as_deref() else {
            continue;
        };
        let mut clear = parent_id == node.id
            || !container.get(parent_id).copied().unwrap_or(false);
        if !clear {
            let mut visited: HashSet<&str> = HashSet::new();
            visited.insert(node.id.as_str());
            let mut current = Some(parent_id);
            while let Some(id) = current {
                if !visited.insert(id) {
                    clear = true;
                    break;
                }
                current = parents.get(id).and_then(|p| p.as_deref());
            }
        }
        if clear {
            cleared.push(idx);
        }
    }
    for idx in cleared {
        nodes[idx].parent = None;
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeData;

    fn node(id: &str, x: f32, y: f32, parent: Option<&str>) -> Node {
        Node {
            id: id.to_string(),
            position: Point::new(x, y),
            size: None,
            parent: parent.map(str::to_string),
            data: NodeData::Asset {
                label: id.to_string(),
                entity: id.to_string(),
                category: None,
                is_container: false,
                provenance: None,
            },
        }
    }

    fn container(id: &str, x: f32, y: f32, parent: Option<&str>) -> Node {
        Node {
            id: id.to_string(),
            position: Point::new(x, y),
            size: None,
            parent: parent.map(str::to_string),
            data: NodeData::Subflow {
                label: id.to_string(),
                anchor_entity: id.to_string(),
            },
        }
    }

    #[test]
    fn absolute_position_sums_parent_chain() {
        let nodes = vec![
            container("outer", 100.0, 50.0, None),
            container("inner", 20.0, 30.0, Some("outer")),
            node("leaf", 5.0, 7.0, Some("inner")),
        ];
        let by_id = index_nodes(&nodes);
        let abs = absolute_position(&nodes[2], &by_id);
        assert_eq!((abs.x, abs.y), (125.0, 87.0));
    }

    #[test]
    fn absolute_position_survives_cyclic_chain() {
        let mut a = container("a", 10.0, 0.0, Some("b"));
        let b = container("b", 20.0, 0.0, Some("a"));
        a.parent = Some("b".to_string());
        let nodes = vec![a, b];
        let by_id = index_nodes(&nodes);
        // walk ends once an id repeats; partial sum only
        let abs = absolute_position(&nodes[0], &by_id);
        assert_eq!(abs.x, 30.0);
    }

    #[test]
    fn absolute_position_ignores_dangling_parent() {
        let nodes = vec![node("leaf", 5.0, 7.0, Some("ghost"))];
        let by_id = index_nodes(&nodes);
        let abs = absolute_position(&nodes[0], &by_id);
        assert_eq!((abs.x, abs.y), (5.0, 7.0));
    }

    #[test]
    fn effective_size_defaults_by_kind() {
        let config = CanvasConfig::default();
        let leaf = node("a", 0.0, 0.0, None);
        let sub = container("c", 0.0, 0.0, None);
        assert_eq!(effective_size(&leaf, &config), config.leaf_size);
        assert_eq!(effective_size(&sub, &config), config.container_size);
        let mut sized = node("b", 0.0, 0.0, None);
        sized.size = Some(Size::new(60.0, 40.0));
        assert_eq!(effective_size(&sized, &config), Size::new(60.0, 40.0));
    }

    #[test]
    fn cycle_detection() {
        let nodes = vec![
            container("outer", 0.0, 0.0, None),
            container("inner", 0.0, 0.0, Some("outer")),
            node("leaf", 0.0, 0.0, Some("inner")),
        ];
        let by_id = index_nodes(&nodes);
        assert!(would_create_cycle("outer", "outer", &by_id));
        assert!(would_create_cycle("outer", "inner", &by_id));
        assert!(would_create_cycle("outer", "leaf", &by_id));
        assert!(!would_create_cycle("leaf", "outer", &by_id));
        assert!(!would_create_cycle("inner", "outer", &by_id));
    }

    #[test]
    fn sanitize_clears_dangling_self_and_cyclic_parents() {
        let mut cyc_a = container("ca", 0.0, 0.0, Some("cb"));
        cyc_a.parent = Some("cb".to_string());
        let cyc_b = container("cb", 0.0, 0.0, Some("ca"));
        let mut selfie = container("me", 0.0, 0.0, None);
        selfie.parent = Some("me".to_string());
        let nodes = vec![
            node("dangling", 0.0, 0.0, Some("ghost")),
            selfie,
            cyc_a,
            cyc_b,
            container("ok", 0.0, 0.0, None),
            node("kept", 0.0, 0.0, Some("ok")),
        ];
        let sanitized = sanitize_parenting(nodes);
        assert!(sanitized[0].parent.is_none());
        assert!(sanitized[1].parent.is_none());
        assert!(sanitized[2].parent.is_none());
        assert!(sanitized[3].parent.is_none());
        assert_eq!(sanitized[5].parent.as_deref(), Some("ok"));
    }

    #[test]
    fn sanitize_clears_parent_pointing_at_leaf() {
        let nodes = vec![
            node("plain", 0.0, 0.0, None),
            node("child", 0.0, 0.0, Some("plain")),
        ];
        let sanitized = sanitize_parenting(nodes);
        assert!(sanitized[1].parent.is_none());
    }

    #[test]
    fn is_inside_walks_nested_chains() {
        let nodes = vec![
            container("outer", 0.0, 0.0, None),
            container("inner", 0.0, 0.0, Some("outer")),
            node("leaf", 0.0, 0.0, Some("inner")),
            node("free", 0.0, 0.0, None),
        ];
        let by_id = index_nodes(&nodes);
        assert!(is_inside(&nodes[2], "inner", &by_id));
        assert!(is_inside(&nodes[2], "outer", &by_id));
        assert!(!is_inside(&nodes[3], "outer", &by_id));
        assert!(!is_inside(&nodes[0], "outer", &by_id));
    }
}
