//! Building and dissolving subflow containers.
//!
//! `create_container_around_anchor` wraps an anchor and its extracted
//! subgraph into a new container node; `lift_container_children` is the
//! inverse, promoting a container's children back out and deleting it. Both
//! take a snapshot and return a new one; the only errors are caller contract
//! violations (ids that do not resolve).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CanvasConfig;
use crate::error::CanvasError;
use crate::extract::extract_subgraph;
use crate::geometry::{absolute_position, index_nodes, sanitize_parenting};
use crate::layout::{Bounds, LayoutEngine, bounding_box, container_extent, layout_subgraph};
use crate::model::{Edge, Node, NodeData, Point, Snapshot, WrapProvenance};

// Entity ids come from external stores and may carry arbitrary characters;
// node ids stay in a DOM-id-safe alphabet.
static ID_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("id pattern"));

fn canonical_id(entity: &str) -> String {
    let cleaned = ID_UNSAFE.replace_all(entity, "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "node".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Claims a free id: the candidate itself, the candidate suffixed with the
/// scope (the enclosing container's id), then numbered variants.
fn mint_id(candidate: &str, scope: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(candidate.to_string()) {
        return candidate.to_string();
    }
    let scoped = format!("{candidate}_{scope}");
    if taken.insert(scoped.clone()) {
        return scoped;
    }
    let mut counter = 2usize;
    loop {
        let numbered = format!("{scoped}_{counter}");
        if taken.insert(numbered.clone()) {
            return numbered;
        }
        counter += 1;
    }
}

pub struct WrapOptions<'a> {
    /// Fresh layered layout for the wrapped subgraph. `None` wraps in place,
    /// preserving the user's manual arrangement.
    pub layout: Option<&'a dyn LayoutEngine>,
    /// Container parent for anchors logically owned by a non-diagram entity
    /// (e.g. a shop floor); consulted only when the anchor has no container
    /// of its own.
    pub parent_hint: Option<&'a dyn Fn(&Node) -> Option<String>>,
}

impl Default for WrapOptions<'_> {
    fn default() -> Self {
        Self {
            layout: None,
            parent_hint: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WrapOutcome {
    pub snapshot: Snapshot,
    pub container_id: String,
}

/// Wraps the anchor and its boundary-respecting subgraph into a new subflow
/// container: sizes the container from the subgraph's bounding box, remints
/// every moved node's id collision-free, reparents and rewires, and records
/// provenance so the operation can be reversed.
pub fn create_container_around_anchor(
    anchor_id: &str,
    snapshot: &Snapshot,
    config: &CanvasConfig,
    options: &WrapOptions<'_>,
) -> Result<WrapOutcome, CanvasError> {
    let by_id = index_nodes(&snapshot.nodes);
    let Some(anchor) = by_id.get(anchor_id).copied() else {
        return Err(CanvasError::UnknownAnchor(anchor_id.to_string()));
    };

    let extraction = extract_subgraph(anchor_id, &snapshot.nodes, &snapshot.edges);
    let mut member_nodes: Vec<Node> = Vec::with_capacity(extraction.child_nodes.len() + 1);
    member_nodes.push(anchor.clone());
    member_nodes.extend(extraction.child_nodes.iter().cloned());

    let mut absolute: HashMap<String, Point> = HashMap::new();
    for node in &member_nodes {
        absolute.insert(node.id.clone(), absolute_position(node, &by_id));
    }
    // The group keeps its current top-left on canvas in both modes.
    let placement = bounding_box(&member_nodes, &absolute, config);

    let content: Bounds;
    let content_positions: HashMap<String, Point>;
    match options.layout {
        Some(engine) => {
            let positions = layout_subgraph(engine, &member_nodes, &extraction.child_edges, config);
            content = bounding_box(&member_nodes, &positions, config);
            content_positions = positions;
        }
        None => {
            content = placement;
            content_positions = absolute.clone();
        }
    }

    let container_parent: Option<String> = anchor.parent.clone().or_else(|| {
        options
            .parent_hint
            .and_then(|resolve| resolve(anchor))
            .filter(|id| by_id.contains_key(id.as_str()))
    });
    let container_abs = Point {
        x: placement.min_x - config.container_padding,
        y: placement.min_y - config.container_padding - config.header_height,
    };
    let parent_abs = container_parent
        .as_deref()
        .and_then(|id| by_id.get(id).copied())
        .map(|parent| absolute_position(parent, &by_id))
        .unwrap_or_default();

    let mut taken: HashSet<String> = snapshot.nodes.iter().map(|node| node.id.clone()).collect();
    let container_candidate = format!("subflow_{}", canonical_id(anchor.data.entity()));
    let container_id = mint_id(&container_candidate, "group", &mut taken);

    let mut remap: HashMap<String, String> = HashMap::new();
    for node in &member_nodes {
        let candidate = canonical_id(node.data.entity());
        let new_id = mint_id(&candidate, &container_id, &mut taken);
        remap.insert(node.id.clone(), new_id);
    }

    let moved_ids: HashSet<&str> = member_nodes.iter().map(|node| node.id.as_str()).collect();
    let mut nodes: Vec<Node> = Vec::with_capacity(snapshot.nodes.len() + 1);
    for node in &snapshot.nodes {
        if !moved_ids.contains(node.id.as_str()) {
            nodes.push(node.clone());
            continue;
        }
        let old_id = node.id.clone();
        let mut moved = node.clone();
        moved.id = remap
            .get(&old_id)
            .cloned()
            .unwrap_or_else(|| old_id.clone());
        moved.data.set_provenance(WrapProvenance {
            pre_wrap_id: old_id.clone(),
            pre_wrap_parent: node.parent.clone(),
        });
        moved.parent = Some(container_id.clone());
        moved.position = match options.layout {
            Some(_) => {
                let laid = content_positions.get(&old_id).copied().unwrap_or_default();
                Point {
                    x: laid.x - content.min_x + config.container_padding,
                    y: laid.y - content.min_y + config.container_padding + config.header_height,
                }
            }
            None => {
                let abs = absolute.get(&old_id).copied().unwrap_or_default();
                Point {
                    x: abs.x - container_abs.x,
                    y: abs.y - container_abs.y,
                }
            }
        };
        if old_id == anchor_id {
            moved.data.mark_container_anchor();
        }
        nodes.push(moved);
    }

    nodes.push(Node {
        id: container_id.clone(),
        position: Point {
            x: container_abs.x - parent_abs.x,
            y: container_abs.y - parent_abs.y,
        },
        size: Some(container_extent(&content, config)),
        parent: container_parent,
        data: NodeData::Subflow {
            label: anchor.data.label().to_string(),
            anchor_entity: anchor.data.entity().to_string(),
        },
    });

    let live: HashSet<String> = nodes.iter().map(|node| node.id.clone()).collect();
    let edges = rewire_edges(&snapshot.edges, &remap, &live);
    let nodes = sanitize_parenting(nodes);

    Ok(WrapOutcome {
        snapshot: Snapshot { nodes, edges },
        container_id,
    })
}

/// Dissolves a container: every direct child is promoted to the container's
/// own parent (or canvas root) at an unchanged absolute position, pre-wrap
/// ids are restored where still free, and the container node is removed.
/// Deeper descendants ride along with their surviving parents.
pub fn lift_container_children(
    container_id: &str,
    snapshot: &Snapshot,
) -> Result<Snapshot, CanvasError> {
    let by_id = index_nodes(&snapshot.nodes);
    let Some(container) = by_id.get(container_id).copied() else {
        return Err(CanvasError::UnknownContainer(container_id.to_string()));
    };
    if !container.kind().is_container() {
        return Err(CanvasError::NotAContainer(container_id.to_string()));
    }

    let new_parent = container.parent.clone();
    let parent_abs = new_parent
        .as_deref()
        .and_then(|id| by_id.get(id).copied())
        .map(|parent| absolute_position(parent, &by_id))
        .unwrap_or_default();

    // Direct and indirect descendants; iterate to a fixpoint since the node
    // list is not ordered parent-first.
    let mut descendants: HashSet<&str> = HashSet::new();
    loop {
        let mut changed = false;
        for node in &snapshot.nodes {
            if descendants.contains(node.id.as_str()) {
                continue;
            }
            let Some(parent) = node.parent.as_deref() else {
                continue;
            };
            if parent == container_id || descendants.contains(parent) {
                descendants.insert(node.id.as_str());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Restore pre-wrap ids where free; a node whose restored id is taken
    // keeps its current (unique) id instead of colliding.
    let mut taken: HashSet<String> = snapshot
        .nodes
        .iter()
        .filter(|node| node.id != container_id && !descendants.contains(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();
    let mut remap: HashMap<String, String> = HashMap::new();
    for node in &snapshot.nodes {
        if !descendants.contains(node.id.as_str()) {
            continue;
        }
        let candidate = node
            .data
            .provenance()
            .map(|record| record.pre_wrap_id.clone())
            .unwrap_or_else(|| node.id.clone());
        let new_id = if taken.insert(candidate.clone()) {
            candidate
        } else if taken.insert(node.id.clone()) {
            node.id.clone()
        } else {
            let mut counter = 2usize;
            loop {
                let numbered = format!("{}_{}", node.id, counter);
                if taken.insert(numbered.clone()) {
                    break numbered;
                }
                counter += 1;
            }
        };
        if new_id != node.id {
            remap.insert(node.id.clone(), new_id);
        }
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(snapshot.nodes.len().saturating_sub(1));
    for node in &snapshot.nodes {
        if node.id == container_id {
            continue;
        }
        if !descendants.contains(node.id.as_str()) {
            nodes.push(node.clone());
            continue;
        }
        let mut lifted = node.clone();
        if let Some(new_id) = remap.get(&node.id) {
            lifted.id = new_id.clone();
        }
        if node.parent.as_deref() == Some(container_id) {
            let abs = absolute_position(node, &by_id);
            lifted.parent = new_parent.clone();
            lifted.position = Point {
                x: abs.x - parent_abs.x,
                y: abs.y - parent_abs.y,
            };
            lifted.data.clear_container_anchor();
            lifted.data.clear_provenance();
        } else if let Some(parent) = node.parent.as_deref() {
            if let Some(new_parent_id) = remap.get(parent) {
                lifted.parent = Some(new_parent_id.clone());
            }
        }
        nodes.push(lifted);
    }

    let live: HashSet<String> = nodes.iter().map(|node| node.id.clone()).collect();
    let edges = rewire_edges(&snapshot.edges, &remap, &live);
    let nodes = sanitize_parenting(nodes);

    Ok(Snapshot { nodes, edges })
}

/// Maps edge endpoints through the id remap and drops edges whose endpoints
/// no longer resolve to a live node.
fn rewire_edges(
    edges: &[Edge],
    remap: &HashMap<String, String>,
    live: &HashSet<String>,
) -> Vec<Edge> {
    let mut rewired = Vec::with_capacity(edges.len());
    for edge in edges {
        let mut copy = edge.clone();
        if let Some(source) = remap.get(&copy.source) {
            copy.source = source.clone();
        }
        if let Some(target) = remap.get(&copy.target) {
            copy.target = target.clone();
        }
        if !live.contains(&copy.source) || !live.contains(&copy.target) {
            continue;
        }
        rewired.push(copy);
    }
    rewired
}
