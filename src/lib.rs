pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod subflow;

pub use config::{CanvasConfig, load_config};
pub use error::CanvasError;
pub use extract::{Extraction, extract_subgraph};
pub use geometry::{
    absolute_position, effective_size, index_nodes, is_inside, sanitize_parenting,
    would_create_cycle,
};
pub use layout::{
    Bounds, DagreLayout, Direction, LayoutEngine, LayoutItem, bounding_box, container_extent,
    layout_subgraph,
};
pub use model::{Edge, Node, NodeData, NodeKind, Point, Size, Snapshot, WrapProvenance};
pub use subflow::{WrapOptions, WrapOutcome, create_container_around_anchor, lift_container_children};
