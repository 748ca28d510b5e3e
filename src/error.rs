use thiserror::Error;

/// Caller contract violations. Data anomalies inside a snapshot (dangling
/// parents, containment cycles, id collisions) are corrected while
/// transforming and never surface here.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("unknown anchor node: {0}")]
    UnknownAnchor(String),
    #[error("unknown container node: {0}")]
    UnknownContainer(String),
    #[error("node {0} is not a container")]
    NotAContainer(String),
}
