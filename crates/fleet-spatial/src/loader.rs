//! JSON road-graph loader.
//!
//! # File format
//!
//! The file is one JSON object keyed by node identity (as a string):
//!
//! ```json
//! {
//!   "65280": {
//!     "id": 65280, "lat": 37.7749, "lon": -122.4194,
//!     "traffic_light": true, "stop_sign": false,
//!     "neighbors": { "65281": { "distance": 84.2, "speed": 40.0 } }
//!   }
//! }
//! ```
//!
//! `speed` is optional; `traffic_light`, `stop_sign` and `neighbors` default
//! to `false`/empty.  Every neighbour entry becomes one directed edge.
//!
//! # Validation
//!
//! A key that disagrees with its record's `id`, or two records with the same
//! `id`, make the whole file malformed.  A neighbour key that is not an
//! integer or names a node absent from the file is skipped with a warning;
//! the rest of the graph still loads.
//!
//! Dense `NodeId`s are assigned in ascending source-id order, so the same
//! file always produces the same graph.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use fleet_core::{GeoPoint, NodeId};

use crate::graph::{Controls, RoadGraph, RoadGraphBuilder};
use crate::{SpatialError, SpatialResult};

// ── File records ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    id:  i64,
    lat: f64,
    lon: f64,
    #[serde(default)]
    neighbors: HashMap<String, NeighborRecord>,
    #[serde(default)]
    traffic_light: bool,
    #[serde(default)]
    stop_sign: bool,
}

#[derive(Deserialize)]
struct NeighborRecord {
    distance: f64,
    #[serde(default)]
    speed: Option<f64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a road graph from a JSON file on disk.
///
/// Any failure (missing file, malformed JSON, inconsistent ids) is returned
/// as an error; the caller is expected to treat it as fatal at startup.
pub fn load_graph_json(path: &Path) -> SpatialResult<RoadGraph> {
    let file = File::open(path)?;
    let graph = load_graph_reader(BufReader::new(file))?;
    info!(
        "loaded road graph from {}: {} nodes, {} edges, {} routable",
        path.display(),
        graph.node_count(),
        graph.edge_count(),
        graph.connected_nodes().iter().filter(|&&n| graph.out_degree(n) >= 2).count(),
    );
    Ok(graph)
}

/// Load a road graph from any reader producing the JSON format above.
pub fn load_graph_reader<R: Read>(reader: R) -> SpatialResult<RoadGraph> {
    let records: HashMap<String, NodeRecord> = serde_json::from_reader(reader)?;
    build_graph(records)
}

/// Parse a road graph from an in-memory JSON string.
pub fn parse_graph_str(json: &str) -> SpatialResult<RoadGraph> {
    let records: HashMap<String, NodeRecord> = serde_json::from_str(json)?;
    build_graph(records)
}

// ── Internals ─────────────────────────────────────────────────────────────────

fn build_graph(records: HashMap<String, NodeRecord>) -> SpatialResult<RoadGraph> {
    let mut nodes: Vec<(String, NodeRecord)> = records.into_iter().collect();
    nodes.sort_by_key(|(_, rec)| rec.id);

    // Pass 1: validate identities and assign dense NodeIds.
    let mut builder = RoadGraphBuilder::with_capacity(nodes.len(), 0);
    let mut by_source: FxHashMap<i64, NodeId> = FxHashMap::default();
    for (key, rec) in &nodes {
        match key.trim().parse::<i64>() {
            Ok(k) if k == rec.id => {}
            _ => {
                return Err(SpatialError::Malformed(format!(
                    "node key {key:?} does not match its id {}",
                    rec.id
                )));
            }
        }
        if !rec.lat.is_finite() || !rec.lon.is_finite() {
            return Err(SpatialError::Malformed(format!("node {} has a non-finite position", rec.id)));
        }
        let controls = Controls { traffic_light: rec.traffic_light, stop_sign: rec.stop_sign };
        let id = builder.add_node_with(rec.id, GeoPoint::new(rec.lat, rec.lon), controls);
        if by_source.insert(rec.id, id).is_some() {
            return Err(SpatialError::Malformed(format!("duplicate node id {}", rec.id)));
        }
    }

    // Pass 2: edges, in ascending neighbour id for a reproducible layout.
    let mut skipped = 0usize;
    for (_, rec) in &nodes {
        let from = by_source[&rec.id];
        let mut edges: Vec<(i64, &NeighborRecord)> = Vec::with_capacity(rec.neighbors.len());
        for (key, nb) in &rec.neighbors {
            match key.trim().parse::<i64>() {
                Ok(to) if by_source.contains_key(&to) => edges.push((to, nb)),
                Ok(_) => {
                    warn!("node {}: neighbour {key} is not in the graph, skipping", rec.id);
                    skipped += 1;
                }
                Err(_) => {
                    warn!("node {}: neighbour key {key:?} is not an integer, skipping", rec.id);
                    skipped += 1;
                }
            }
        }
        edges.sort_by_key(|&(to, _)| to);
        for (to, nb) in edges {
            builder.add_directed_edge(from, by_source[&to], nb.distance, nb.speed);
        }
    }
    if skipped > 0 {
        warn!("skipped {skipped} neighbour entries with unknown or unparsable ids");
    }

    Ok(builder.build())
}
