//! Adapter between the engine and a layered graph-drawing algorithm.
//!
//! The engine only needs one capability from a layout implementation: sized
//! nodes plus directed edges in, one position per node out, all in a single
//! coordinate space. `DagreLayout` provides that over dagre; anything honoring
//! the same contract can be substituted.

use std::collections::{HashMap, HashSet};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::geometry::effective_size;
use crate::model::{Edge, Node, Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    TopDown,
    BottomTop,
    LeftRight,
    RightLeft,
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "tb",
        Direction::BottomTop => "bt",
        Direction::LeftRight => "lr",
        Direction::RightLeft => "rl",
    }
}

/// One node as a layout algorithm sees it.
#[derive(Debug, Clone)]
pub struct LayoutItem {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

pub trait LayoutEngine {
    /// Positions are top-left corners in the algorithm's own coordinate
    /// space. Items missing from the result keep their previous placement.
    fn layout(&self, items: &[LayoutItem], edges: &[(String, String)]) -> HashMap<String, Point>;
}

/// Layered layout over dagre, matching how the surrounding canvas arranges
/// freshly grouped subflows.
#[derive(Debug, Clone)]
pub struct DagreLayout {
    pub direction: Direction,
    pub node_spacing: f32,
    pub rank_spacing: f32,
}

impl DagreLayout {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            direction: Direction::TopDown,
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

impl LayoutEngine for DagreLayout {
    fn layout(&self, items: &[LayoutItem], edges: &[(String, String)]) -> HashMap<String, Point> {
        let mut positions = HashMap::new();
        if items.is_empty() {
            return positions;
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(dagre_rankdir(self.direction).to_string());
        graph_config.nodesep = Some(self.node_spacing);
        graph_config.ranksep = Some(self.rank_spacing);
        graph_config.marginx = Some(8.0);
        graph_config.marginy = Some(8.0);
        dagre_graph.set_graph(graph_config);

        for (order, item) in items.iter().enumerate() {
            let mut node = DagreNode::default();
            node.width = item.width;
            node.height = item.height;
            node.order = Some(order);
            dagre_graph.set_node(item.id.clone(), Some(node));
        }

        let node_set: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
        let mut edge_set: HashSet<(String, String)> = HashSet::new();
        for (from, to) in edges {
            if !node_set.contains(from.as_str()) || !node_set.contains(to.as_str()) {
                continue;
            }
            if !edge_set.insert((from.clone(), to.clone())) {
                continue;
            }
            let edge_label = DagreEdge::default();
            let _ = dagre_graph.set_edge(from, to, Some(edge_label), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        for item in items {
            let Some(dagre_node) = dagre_graph.node(&item.id) else {
                continue;
            };
            positions.insert(
                item.id.clone(),
                Point {
                    x: dagre_node.x - item.width / 2.0,
                    y: dagre_node.y - item.height / 2.0,
                },
            );
        }
        positions
    }
}

/// Runs a layout engine over diagram nodes, sizing each via `effective_size`
/// and dropping edges whose endpoints are outside the set.
pub fn layout_subgraph(
    engine: &dyn LayoutEngine,
    nodes: &[Node],
    edges: &[Edge],
    config: &CanvasConfig,
) -> HashMap<String, Point> {
    let items: Vec<LayoutItem> = nodes
        .iter()
        .map(|node| {
            let size = effective_size(node, config);
            LayoutItem {
                id: node.id.clone(),
                width: size.width,
                height: size.height,
            }
        })
        .collect();
    let pairs: Vec<(String, String)> = edges
        .iter()
        .map(|edge| (edge.source.clone(), edge.target.clone()))
        .collect();
    engine.layout(&items, &pairs)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Bounding box over the given nodes using their effective sizes and the
/// supplied positions. Callers pass layout-space positions after a fresh
/// auto-layout, or current absolute positions to wrap in place. Nodes without
/// a position are skipped.
pub fn bounding_box(
    nodes: &[Node],
    positions: &HashMap<String, Point>,
    config: &CanvasConfig,
) -> Bounds {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for node in nodes {
        let Some(position) = positions.get(&node.id) else {
            continue;
        };
        let size = effective_size(node, config);
        min_x = min_x.min(position.x);
        min_y = min_y.min(position.y);
        max_x = max_x.max(position.x + size.width);
        max_y = max_y.max(position.y + size.height);
    }
    if !min_x.is_finite() {
        return Bounds::default();
    }
    Bounds {
        min_x,
        min_y,
        max_x,
        max_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Container size for a content bounding box: padding on every side plus the
/// header strip, floored at the configured minimum.
pub fn container_extent(content: &Bounds, config: &CanvasConfig) -> Size {
    Size {
        width: (content.width + 2.0 * config.container_padding)
            .max(config.min_container_size.width),
        height: (content.height + 2.0 * config.container_padding + config.header_height)
            .max(config.min_container_size.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeData;

    fn asset(id: &str) -> Node {
        Node {
            id: id.to_string(),
            position: Point::default(),
            size: None,
            parent: None,
            data: NodeData::Asset {
                label: id.to_string(),
                entity: id.to_string(),
                category: None,
                is_container: false,
                provenance: None,
            },
        }
    }

    #[test]
    fn bounding_box_uses_sizes_and_positions() {
        let config = CanvasConfig::default();
        let nodes = vec![asset("a"), asset("b")];
        let mut positions = HashMap::new();
        positions.insert("a".to_string(), Point::new(100.0, 100.0));
        positions.insert("b".to_string(), Point::new(100.0, 200.0));
        let bounds = bounding_box(&nodes, &positions, &config);
        assert_eq!(bounds.min_x, 100.0);
        assert_eq!(bounds.min_y, 100.0);
        assert_eq!(bounds.max_x, 250.0);
        assert_eq!(bounds.max_y, 280.0);
        assert_eq!(bounds.width, 150.0);
        assert_eq!(bounds.height, 180.0);
    }

    #[test]
    fn bounding_box_without_positions_is_empty() {
        let config = CanvasConfig::default();
        let nodes = vec![asset("a")];
        let bounds = bounding_box(&nodes, &HashMap::new(), &config);
        assert_eq!(bounds, Bounds::default());
    }

    #[test]
    fn container_extent_adds_padding_and_header() {
        let config = CanvasConfig::default();
        let content = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 150.0,
            max_y: 180.0,
            width: 150.0,
            height: 180.0,
        };
        let extent = container_extent(&content, &config);
        assert_eq!(extent.width, 150.0 + 48.0);
        assert_eq!(extent.height, 180.0 + 48.0 + 40.0);
    }

    #[test]
    fn container_extent_respects_minimum() {
        let config = CanvasConfig::default();
        let content = Bounds {
            width: 10.0,
            height: 10.0,
            ..Bounds::default()
        };
        let extent = container_extent(&content, &config);
        assert_eq!(extent, config.min_container_size);
    }

    #[test]
    fn dagre_separates_ranks_top_down() {
        let config = CanvasConfig::default();
        let engine = DagreLayout::new(&config);
        let nodes = vec![asset("a"), asset("b"), asset("c")];
        let edges = vec![
            Edge {
                id: "e1".to_string(),
                source: "a".to_string(),
                target: "b".to_string(),
                source_handle: None,
                target_handle: None,
            },
            Edge {
                id: "e2".to_string(),
                source: "b".to_string(),
                target: "c".to_string(),
                source_handle: None,
                target_handle: None,
            },
        ];
        let positions = layout_subgraph(&engine, &nodes, &edges, &config);
        assert_eq!(positions.len(), 3);
        assert!(positions["b"].y > positions["a"].y);
        assert!(positions["c"].y > positions["b"].y);
    }

    #[test]
    fn dagre_separates_ranks_left_right() {
        let config = CanvasConfig::default();
        let engine = DagreLayout::new(&config).with_direction(Direction::LeftRight);
        let nodes = vec![asset("a"), asset("b")];
        let edges = vec![Edge {
            id: "e1".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            source_handle: None,
            target_handle: None,
        }];
        let positions = layout_subgraph(&engine, &nodes, &edges, &config);
        assert!(positions["b"].x > positions["a"].x);
    }
}
