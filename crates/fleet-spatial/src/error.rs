//! Spatial-subsystem error type.

use thiserror::Error;

use fleet_core::{GeoPoint, NodeId};

/// Errors produced by `fleet-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("no node with at least two neighbours near {0}")]
    NoRoutableNode(GeoPoint),

    #[error("malformed graph: {0}")]
    Malformed(String),

    #[error("graph JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
