//! Routing trait and the A* path finder.
//!
//! # Pluggability
//!
//! `fleet-sim` calls routing via the [`Router`] trait, and the A* search
//! takes its edge costs from an [`EdgeCost`] model.  Production uses
//! [`SampledTravelTime`], whose intersection penalty is drawn from the
//! caller's RNG at expansion time; tests use
//! [`SampledTravelTime::deterministic`] so search results are fixed.
//!
//! # Cost units
//!
//! All costs are seconds (`f64`).  `Route::search_cost_secs` is the sampled
//! cost of the returned path, which is *not* an ETA; use
//! [`EtaEstimator`](crate::EtaEstimator) for that.
//!
//! # Optimality
//!
//! With [`Heuristic::DegreeDistance`] (the default) the heuristic is in
//! degrees while costs are in seconds, so it is not a lower bound and the
//! returned route is the best found in this search order, not a proven
//! optimum.  [`Heuristic::TravelTime`] and [`Heuristic::Zero`] give optimal
//! routes for the sampled costs, provided edge lengths are never shorter than
//! the straight-line distance between their endpoints.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::Serialize;

use fleet_core::{EdgeId, EngineConfig, GeoPoint, Heuristic, NodeId, SearchDelayModel, SimRng};

use crate::graph::{RoadGraph, RoadNode};
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: node snapshots from origin to destination.
///
/// An empty route means "no path"; the engine facade returns one whenever
/// the router reports an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    pub nodes: Vec<RoadNode>,
    /// Sampled search cost of the whole route, in seconds.
    pub search_cost_secs: f64,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn first(&self) -> Option<&RoadNode> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&RoadNode> {
        self.nodes.last()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn positions(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.nodes.iter().map(|n| n.pos)
    }
}

// ── Edge cost models ──────────────────────────────────────────────────────────

/// Cost of traversing one edge during search.
pub trait EdgeCost: Send + Sync {
    /// Seconds to traverse `edge`.  May draw from `rng`.
    fn cost_secs(&self, graph: &RoadGraph, edge: EdgeId, rng: &mut SimRng) -> f64;

    /// Fastest speed any edge can be traversed at under this model, used to
    /// scale the travel-time heuristic.
    fn speed_bound_kph(&self, graph: &RoadGraph) -> f64;
}

/// Travel time at the posted speed plus a sampled intersection penalty at
/// the edge's destination node.
///
/// A traffic light adds `light_penalty_secs` with `light_probability`;
/// otherwise a stop sign adds `stop_penalty_secs` unconditionally.
#[derive(Clone, Debug)]
pub struct SampledTravelTime {
    pub delay:              SearchDelayModel,
    pub fallback_speed_kph: f64,
}

impl SampledTravelTime {
    pub fn new(delay: SearchDelayModel, fallback_speed_kph: f64) -> Self {
        Self { delay, fallback_speed_kph }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.search_delay.clone(), config.fallback_speed_kph)
    }

    /// Pure travel time with no intersection penalty; never touches the RNG.
    pub fn deterministic(fallback_speed_kph: f64) -> Self {
        Self::new(SearchDelayModel::none(), fallback_speed_kph)
    }
}

impl EdgeCost for SampledTravelTime {
    fn cost_secs(&self, graph: &RoadGraph, edge: EdgeId, rng: &mut SimRng) -> f64 {
        let speed_mps = graph.effective_speed_kph(edge, self.fallback_speed_kph) / 3.6;
        let travel = graph.edge_length_m(edge) / speed_mps;

        let controls = graph.controls(graph.edge_to(edge));
        let penalty = if controls.traffic_light {
            if self.delay.light_probability > 0.0 && rng.gen_bool(self.delay.light_probability) {
                self.delay.light_penalty_secs
            } else {
                0.0
            }
        } else if controls.stop_sign {
            self.delay.stop_penalty_secs
        } else {
            0.0
        };
        travel + penalty
    }

    fn speed_bound_kph(&self, graph: &RoadGraph) -> f64 {
        graph.max_speed_kph().max(self.fallback_speed_kph)
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable single-pair path finder.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the engine shares one router
/// between the driver thread and request-handling threads.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// `from == to` yields a one-node route.  Unknown ids and unreachable
    /// destinations are errors.
    fn route(&self, graph: &RoadGraph, from: NodeId, to: NodeId, rng: &mut SimRng) -> SpatialResult<Route>;

    /// Snap both coordinates to their nearest node with at least two
    /// neighbours, then route between them.
    fn route_coords(
        &self,
        graph: &RoadGraph,
        from: GeoPoint,
        to: GeoPoint,
        rng: &mut SimRng,
    ) -> SpatialResult<Route> {
        let a = graph.nearest_routable(from).ok_or(SpatialError::NoRoutableNode(from))?;
        let b = graph.nearest_routable(to).ok_or(SpatialError::NoRoutableNode(to))?;
        self.route(graph, a, b, rng)
    }
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// A* search over the CSR road graph.
///
/// The open set is a binary heap ordered by `f`, ties broken by the lower
/// `NodeId`.  A node is pushed again only when a strictly smaller `g` is
/// found; superseded heap entries are skipped on pop.
pub struct AStarRouter<C: EdgeCost = SampledTravelTime> {
    pub cost:      C,
    pub heuristic: Heuristic,
}

impl<C: EdgeCost> AStarRouter<C> {
    pub fn new(cost: C, heuristic: Heuristic) -> Self {
        Self { cost, heuristic }
    }
}

impl AStarRouter<SampledTravelTime> {
    /// Stochastic travel-time costs and the configured heuristic.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(SampledTravelTime::from_config(config), config.heuristic.clone())
    }
}

impl<C: EdgeCost> Router for AStarRouter<C> {
    fn route(&self, graph: &RoadGraph, from: NodeId, to: NodeId, rng: &mut SimRng) -> SpatialResult<Route> {
        astar(graph, &self.cost, &self.heuristic, from, to, rng)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone)]
struct OpenEntry {
    f:    f64,
    g:    f64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f.total_cmp(&other.f).then(self.node.cmp(&other.node))
    }
}

/// Heuristic estimate from `node` to `goal`.
struct Estimator {
    goal:     GeoPoint,
    kind:     Heuristic,
    /// Metres per second, for `TravelTime`.
    bound_mps: f64,
}

impl Estimator {
    #[inline]
    fn estimate(&self, pos: GeoPoint) -> f64 {
        match self.kind {
            Heuristic::DegreeDistance => pos.degree_distance(self.goal),
            Heuristic::TravelTime { .. } => pos.distance_m(self.goal) / self.bound_mps,
            Heuristic::Zero => 0.0,
        }
    }
}

fn astar<C: EdgeCost>(
    graph: &RoadGraph,
    cost: &C,
    heuristic: &Heuristic,
    from: NodeId,
    to: NodeId,
    rng: &mut SimRng,
) -> SpatialResult<Route> {
    for id in [from, to] {
        if !graph.contains(id) {
            return Err(SpatialError::NodeNotFound(id));
        }
    }

    let bound_kph = match *heuristic {
        Heuristic::TravelTime { max_speed_kph } => max_speed_kph.max(cost.speed_bound_kph(graph)),
        _ => cost.speed_bound_kph(graph),
    };
    let estimator = Estimator {
        goal:      graph.pos(to),
        kind:      heuristic.clone(),
        bound_mps: (bound_kph / 3.6).max(f64::MIN_POSITIVE),
    };

    let n = graph.node_count();
    // best_g[v] = cheapest known cost to reach v.
    let mut best_g = vec![f64::INFINITY; n];
    // parent[v] = predecessor on the cheapest known path; INVALID when unset.
    let mut parent = vec![NodeId::INVALID; n];
    let mut closed = vec![false; n];

    best_g[from.index()] = 0.0;
    let mut open: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
    open.push(Reverse(OpenEntry { f: estimator.estimate(graph.pos(from)), g: 0.0, node: from }));

    while let Some(Reverse(OpenEntry { g, node, .. })) = open.pop() {
        if closed[node.index()] || g > best_g[node.index()] {
            continue;
        }
        if node == to {
            return Ok(reconstruct(graph, &parent, from, to, g));
        }
        closed[node.index()] = true;

        for edge in graph.out_edges(node) {
            let next = graph.edge_to(edge);
            if closed[next.index()] {
                continue;
            }
            let tentative = g + cost.cost_secs(graph, edge, rng);
            if tentative < best_g[next.index()] {
                best_g[next.index()] = tentative;
                parent[next.index()] = node;
                open.push(Reverse(OpenEntry {
                    f:    tentative + estimator.estimate(graph.pos(next)),
                    g:    tentative,
                    node: next,
                }));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(graph: &RoadGraph, parent: &[NodeId], from: NodeId, to: NodeId, cost: f64) -> Route {
    let mut ids = vec![to];
    let mut cur = to;
    while cur != from {
        cur = parent[cur.index()];
        ids.push(cur);
    }
    ids.reverse();
    Route {
        nodes:            ids.into_iter().filter_map(|id| graph.node(id)).collect(),
        search_cost_secs: cost,
    }
}
