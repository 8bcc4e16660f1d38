//! `fleet-spatial`: road graph, graph loading, path finding, and ETA.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                       |
//! |------------|----------------------------------------------------------------|
//! | [`graph`]  | `RoadGraph` (CSR + R-tree), `RoadGraphBuilder`, `RoadNode`     |
//! | [`loader`] | `load_graph_json`, `load_graph_reader`                         |
//! | [`router`] | `Router` trait, `Route`, `AStarRouter`, `EdgeCost` models      |
//! | [`eta`]    | `EtaEstimator` (expected-value travel time)                    |
//! | [`error`]  | `SpatialError`, `SpatialResult<T>`                             |
//!
//! The graph is immutable once built and is shared between threads behind
//! an `Arc` without further synchronisation.

pub mod error;
pub mod eta;
pub mod graph;
pub mod loader;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use eta::EtaEstimator;
pub use graph::{Controls, EdgeInfo, RoadGraph, RoadGraphBuilder, RoadNode};
pub use loader::{load_graph_json, load_graph_reader, parse_graph_str};
pub use router::{AStarRouter, EdgeCost, Route, Router, SampledTravelTime};
