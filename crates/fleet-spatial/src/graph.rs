//! Road graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node and indexed by `EdgeId`, so
//! iterating a node's neighbours during A* expansion is a contiguous scan.
//!
//! # Identities
//!
//! `NodeId` is a dense index assigned at build time.  The identity used in
//! the graph file is kept as `source_id` and can be mapped back with
//! [`RoadGraph::node_by_source_id`].
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) holds every *routable* node: one with at least
//! two outgoing edges: keyed by its position on the unit sphere.  Euclidean
//! nearest-neighbour over those vectors is exact great-circle nearest, which
//! is what coordinate-based routing needs to avoid snapping onto dead ends.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;
use serde::Serialize;

use fleet_core::{EdgeId, GeoPoint, NodeId, SimRng};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 3],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

// ── Node snapshots ────────────────────────────────────────────────────────────

/// Traffic-control devices at an intersection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub traffic_light: bool,
    pub stop_sign:     bool,
}

impl Controls {
    pub const NONE:  Controls = Controls { traffic_light: false, stop_sign: false };
    pub const LIGHT: Controls = Controls { traffic_light: true,  stop_sign: false };
    pub const STOP:  Controls = Controls { traffic_light: false, stop_sign: true  };
}

/// A copy of one node's attributes, as stored in a [`Route`](crate::Route).
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct RoadNode {
    pub id:            NodeId,
    pub source_id:     i64,
    pub pos:           GeoPoint,
    pub traffic_light: bool,
    pub stop_sign:     bool,
}

/// Attributes of one directed edge.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct EdgeInfo {
    pub distance_m: f64,
    /// Posted speed.  `None` when the source data had none.
    pub speed_kph:  Option<f64>,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// Immutable after construction; use [`RoadGraphBuilder`] or
/// [`load_graph_json`](crate::load_graph_json).
pub struct RoadGraph {
    // ── Node data (indexed by NodeId) ─────────────────────────────────────
    node_pos:       Vec<GeoPoint>,
    node_source_id: Vec<i64>,
    node_controls:  Vec<Controls>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    edge_from:      Vec<NodeId>,
    edge_to:        Vec<NodeId>,
    edge_length_m:  Vec<f64>,
    edge_speed_kph: Vec<Option<f64>>,

    // ── Lookup tables ─────────────────────────────────────────────────────
    source_index:   FxHashMap<i64, NodeId>,
    /// Nodes with at least one outgoing edge, ascending.
    connected:      Vec<NodeId>,
    max_speed_kph:  f64,
    routable_idx:   RTree<NodeEntry>,
}

impl RoadGraph {
    /// Construct an empty graph.  Every routing request against it fails.
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    // ── Node attributes ───────────────────────────────────────────────────

    /// Position of `node`.  Panics if `node` is out of range; check with
    /// [`contains`](Self::contains) first when the id comes from outside.
    #[inline]
    pub fn pos(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn controls(&self, node: NodeId) -> Controls {
        self.node_controls[node.index()]
    }

    #[inline]
    pub fn source_id(&self, node: NodeId) -> i64 {
        self.node_source_id[node.index()]
    }

    /// Snapshot of `node`, or `None` if it is not in the graph.
    pub fn node(&self, node: NodeId) -> Option<RoadNode> {
        if !self.contains(node) {
            return None;
        }
        let controls = self.node_controls[node.index()];
        Some(RoadNode {
            id:            node,
            source_id:     self.node_source_id[node.index()],
            pos:           self.node_pos[node.index()],
            traffic_light: controls.traffic_light,
            stop_sign:     controls.stop_sign,
        })
    }

    /// Map a graph-file identity to its dense `NodeId`.
    pub fn node_by_source_id(&self, source_id: i64) -> Option<NodeId> {
        self.source_index.get(&source_id).copied()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// `(neighbour, edge)` pairs for every outgoing edge of `node`.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, EdgeInfo)> + '_ {
        self.out_edges(node).map(|e| (self.edge_to(e), self.edge_info(e)))
    }

    /// The first edge from `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        if !self.contains(from) {
            return None;
        }
        self.out_edges(from).find(|&e| self.edge_to[e.index()] == to)
    }

    #[inline]
    pub fn edge_from(&self, edge: EdgeId) -> NodeId {
        self.edge_from[edge.index()]
    }

    #[inline]
    pub fn edge_to(&self, edge: EdgeId) -> NodeId {
        self.edge_to[edge.index()]
    }

    #[inline]
    pub fn edge_length_m(&self, edge: EdgeId) -> f64 {
        self.edge_length_m[edge.index()]
    }

    #[inline]
    pub fn edge_speed_kph(&self, edge: EdgeId) -> Option<f64> {
        self.edge_speed_kph[edge.index()]
    }

    #[inline]
    pub fn edge_info(&self, edge: EdgeId) -> EdgeInfo {
        EdgeInfo {
            distance_m: self.edge_length_m[edge.index()],
            speed_kph:  self.edge_speed_kph[edge.index()],
        }
    }

    /// Edge speed, or `fallback_kph` when the speed is absent or not positive.
    #[inline]
    pub fn effective_speed_kph(&self, edge: EdgeId, fallback_kph: f64) -> f64 {
        match self.edge_speed_kph[edge.index()] {
            Some(s) if s > 0.0 => s,
            _ => fallback_kph,
        }
    }

    /// Highest posted speed on any edge (0 for a graph without speeds).
    pub fn max_speed_kph(&self) -> f64 {
        self.max_speed_kph
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The great-circle nearest node to `pos` that has at least two
    /// neighbours.  `None` if no such node exists.
    pub fn nearest_routable(&self, pos: GeoPoint) -> Option<NodeId> {
        self.routable_idx
            .nearest_neighbor(&pos.unit_vector())
            .map(|e| e.id)
    }

    /// Nodes with at least one outgoing edge, in ascending `NodeId` order.
    pub fn connected_nodes(&self) -> &[NodeId] {
        &self.connected
    }

    /// A uniformly random node with at least one outgoing edge.
    pub fn random_connected(&self, rng: &mut SimRng) -> Option<NodeId> {
        rng.choose(&self.connected).copied()
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use fleet_core::GeoPoint;
/// use fleet_spatial::{Controls, RoadGraphBuilder};
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node(GeoPoint::new(37.77, -122.42));
/// let c = b.add_node_with(1001, GeoPoint::new(37.78, -122.41), Controls::LIGHT);
/// b.add_road(a, c, 1_200.0, Some(40.0));
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct RoadGraphBuilder {
    nodes:     Vec<RawNode>,
    raw_edges: Vec<RawEdge>,
}

struct RawNode {
    source_id: i64,
    pos:       GeoPoint,
    controls:  Controls,
}

struct RawEdge {
    from:      NodeId,
    to:        NodeId,
    length_m:  f64,
    speed_kph: Option<f64>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add an uncontrolled node whose source identity equals its `NodeId`.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let source_id = self.nodes.len() as i64;
        self.add_node_with(source_id, pos, Controls::NONE)
    }

    /// Add a node with an explicit source identity and control devices.
    pub fn add_node_with(&mut self, source_id: i64, pos: GeoPoint, controls: Controls) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RawNode { source_id, pos, controls });
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64, speed_kph: Option<f64>) {
        self.raw_edges.push(RawEdge { from, to, length_m, speed_kph });
    }

    /// Add edges in **both directions** for a two-way road segment.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64, speed_kph: Option<f64>) {
        self.add_directed_edge(a, b, length_m, speed_kph);
        self.add_directed_edge(b, a, length_m, speed_kph);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> RoadGraph {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps insertion order among a node's edges, so
        // `find_edge` and expansion order are reproducible.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:      Vec<NodeId>      = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<NodeId>      = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f64>         = raw.iter().map(|e| e.length_m).collect();
        let edge_speed_kph: Vec<Option<f64>> = raw.iter().map(|e| e.speed_kph).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let degree = |i: usize| (node_out_start[i + 1] - node_out_start[i]) as usize;

        let connected: Vec<NodeId> = (0..node_count)
            .filter(|&i| degree(i) > 0)
            .map(|i| NodeId(i as u32))
            .collect();

        let max_speed_kph = edge_speed_kph
            .iter()
            .filter_map(|s| *s)
            .fold(0.0_f64, f64::max);

        let mut source_index = FxHashMap::default();
        source_index.reserve(node_count);
        for (i, n) in self.nodes.iter().enumerate() {
            source_index.insert(n.source_id, NodeId(i as u32));
        }

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|&(i, _)| degree(i) >= 2)
            .map(|(i, n)| NodeEntry {
                point: n.pos.unit_vector(),
                id:    NodeId(i as u32),
            })
            .collect();
        let routable_idx = RTree::bulk_load(entries);

        RoadGraph {
            node_pos:       self.nodes.iter().map(|n| n.pos).collect(),
            node_source_id: self.nodes.iter().map(|n| n.source_id).collect(),
            node_controls:  self.nodes.iter().map(|n| n.controls).collect(),
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_speed_kph,
            source_index,
            connected,
            max_speed_kph,
            routable_idx,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
