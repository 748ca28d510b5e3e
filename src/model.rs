use serde::{Deserialize, Serialize};

/// A point in canvas or container-local coordinates. Node positions are
/// relative to the node's parent container when one is set, otherwise
/// canvas-absolute.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Asset,
    Relation,
    ShopFloor,
    Factory,
    Subflow,
}

impl NodeKind {
    /// Kinds that may hold other nodes through the containment relation.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::ShopFloor | NodeKind::Subflow)
    }
}

/// Recorded on a node when it is moved into a container, so a later lift can
/// restore its prior id and parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapProvenance {
    pub pre_wrap_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_wrap_parent: Option<String>,
}

/// Kind-specific payload. Only assets and relations can be pulled into a
/// subflow, so only those variants carry wrap provenance; the anchor stand-in
/// marker lives on the asset variant because subflows are anchored on assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeData {
    #[serde(rename_all = "camelCase")]
    Asset {
        label: String,
        entity: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default)]
        is_container: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provenance: Option<WrapProvenance>,
    },
    #[serde(rename_all = "camelCase")]
    Relation {
        label: String,
        entity: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provenance: Option<WrapProvenance>,
    },
    #[serde(rename_all = "camelCase")]
    ShopFloor { label: String, entity: String },
    #[serde(rename_all = "camelCase")]
    Factory { label: String, entity: String },
    #[serde(rename_all = "camelCase")]
    Subflow { label: String, anchor_entity: String },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Asset { .. } => NodeKind::Asset,
            NodeData::Relation { .. } => NodeKind::Relation,
            NodeData::ShopFloor { .. } => NodeKind::ShopFloor,
            NodeData::Factory { .. } => NodeKind::Factory,
            NodeData::Subflow { .. } => NodeKind::Subflow,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NodeData::Asset { label, .. }
            | NodeData::Relation { label, .. }
            | NodeData::ShopFloor { label, .. }
            | NodeData::Factory { label, .. }
            | NodeData::Subflow { label, .. } => label,
        }
    }

    /// Backing entity id in the external store. For subflow containers this is
    /// the entity of the anchor the container was built around.
    pub fn entity(&self) -> &str {
        match self {
            NodeData::Asset { entity, .. }
            | NodeData::Relation { entity, .. }
            | NodeData::ShopFloor { entity, .. }
            | NodeData::Factory { entity, .. } => entity,
            NodeData::Subflow { anchor_entity, .. } => anchor_entity,
        }
    }

    pub fn provenance(&self) -> Option<&WrapProvenance> {
        match self {
            NodeData::Asset { provenance, .. } | NodeData::Relation { provenance, .. } => {
                provenance.as_ref()
            }
            _ => None,
        }
    }

    /// Records wrap provenance on liftable payloads; other kinds ignore it.
    pub fn set_provenance(&mut self, record: WrapProvenance) {
        match self {
            NodeData::Asset { provenance, .. } | NodeData::Relation { provenance, .. } => {
                *provenance = Some(record);
            }
            _ => {}
        }
    }

    pub fn clear_provenance(&mut self) {
        match self {
            NodeData::Asset { provenance, .. } | NodeData::Relation { provenance, .. } => {
                *provenance = None;
            }
            _ => {}
        }
    }

    pub fn is_container_anchor(&self) -> bool {
        matches!(self, NodeData::Asset { is_container: true, .. })
    }

    pub fn mark_container_anchor(&mut self) {
        if let NodeData::Asset { is_container, .. } = self {
            *is_container = true;
        }
    }

    pub fn clear_container_anchor(&mut self) {
        if let NodeData::Asset { is_container, .. } = self {
            *is_container = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(
        default,
        rename = "parentContainerId",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// One diagram state: ordered nodes plus ordered edges. Treated as an
/// immutable value — every transformation takes a snapshot and returns a new
/// one, so the host application can swap its current state wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    /// Edges whose endpoints both resolve inside `container_id` through their
    /// parent chains. Edges are not owned by containers; this is the only
    /// sense in which an edge belongs to one.
    pub fn internal_edges(&self, container_id: &str) -> Vec<&Edge> {
        let by_id = crate::geometry::index_nodes(&self.nodes);
        self.edges
            .iter()
            .filter(|edge| {
                let source_inside = by_id
                    .get(edge.source.as_str())
                    .is_some_and(|node| crate::geometry::is_inside(node, container_id, &by_id));
                let target_inside = by_id
                    .get(edge.target.as_str())
                    .is_some_and(|node| crate::geometry::is_inside(node, container_id, &by_id));
                source_inside && target_inside
            })
            .collect()
    }
}
