//! The `FleetEngine` facade: shared state, locks, and every public operation.
//!
//! # Locking
//!
//! Each shared structure has its own `Mutex`.  Operations that need more than
//! one take them in this order and never the reverse:
//!
//! ```text
//! clock → fleet → queue → rng → heatmap
//! ```
//!
//! The road graph is immutable and shared through an `Arc` without a lock.
//! A poisoned lock is recovered rather than propagated: every critical
//! section leaves its data structurally valid even if it unwinds.
//!
//! # Absent results
//!
//! Routing failures surface as empty routes, a failed intake as `None`, and
//! an unpairable queue as a `Pairing` with no vehicle.  Only configuration,
//! empty-graph and assignment conflicts are errors.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use fleet_core::{EngineConfig, GeoPoint, SimClock, SimRng, SimTime, VehicleId};
use fleet_dispatch::{
    roster_names, DispatchError, FleetRegistry, Heatmap, HeatmapCell, Matcher, NearestAvailable, Pairing,
    RequestQueue, Requester, Vehicle,
};
use fleet_spatial::{AStarRouter, EtaEstimator, RoadGraph, Route, Router};

use crate::{FleetEvent, NoopObserver, SimObserver, SimResult, StepReport, Stepper, SimError};

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// A committed pairing, as returned by [`FleetEngine::dispatch_next`].
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub vehicle:      VehicleId,
    pub vehicle_name: String,
    pub requester:    Requester,
    /// The newly planned pickup leg.
    pub route:        Route,
}

// ── FleetEngine ───────────────────────────────────────────────────────────────

/// The whole simulation behind one shareable handle.
///
/// Every method takes `&self`; wrap the engine in an `Arc` to use it from the
/// real-time [`Driver`](crate::Driver) and request-handling threads at once.
///
/// Create via [`EngineBuilder`] or [`FleetEngine::new`].
pub struct FleetEngine<R: Router = AStarRouter, M: Matcher = NearestAvailable> {
    config:  EngineConfig,
    graph:   Arc<RoadGraph>,
    router:  R,
    matcher: M,
    eta:     EtaEstimator,

    clock:   Mutex<SimClock>,
    fleet:   Mutex<FleetRegistry>,
    queue:   Mutex<RequestQueue>,
    rng:     Mutex<SimRng>,
    heatmap: Mutex<Heatmap>,
}

impl FleetEngine {
    /// Engine with the A* router and nearest-available matcher configured
    /// from `config`.
    pub fn new(graph: impl Into<Arc<RoadGraph>>, config: EngineConfig) -> SimResult<Self> {
        EngineBuilder::new(graph, config).build()
    }
}

impl<R: Router, M: Matcher> FleetEngine<R, M> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<RoadGraph> {
        &self.graph
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        lock(&self.clock).now
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        lock(&self.clock).ticks
    }

    fn stepper(&self) -> Stepper<'_, R> {
        Stepper::new(&self.graph, &self.router, &self.eta, &self.config)
    }

    // ── Path finding & ETA ────────────────────────────────────────────────

    /// Route between two nodes named by their graph-file ids.
    ///
    /// Returns an empty route if either id is unknown or no path exists.
    pub fn find_path(&self, start_id: i64, end_id: i64) -> Route {
        let (Some(from), Some(to)) = (self.graph.node_by_source_id(start_id), self.graph.node_by_source_id(end_id))
        else {
            debug!("find_path: unknown node id {start_id} or {end_id}");
            return Route::empty();
        };
        let mut rng = lock(&self.rng);
        self.router
            .route(&self.graph, from, to, &mut rng)
            .unwrap_or_else(|e| {
                debug!("find_path {start_id} → {end_id}: {e}");
                Route::empty()
            })
    }

    /// Route between the routable nodes nearest two coordinates.
    pub fn find_path_by_coordinates(&self, from: GeoPoint, to: GeoPoint) -> Route {
        let mut rng = lock(&self.rng);
        self.plan_coords_with(from, to, &mut rng)
    }

    /// Expected minutes to drive `route`.
    pub fn estimate_eta(&self, route: &Route) -> f64 {
        self.eta.estimate_minutes(&self.graph, &route.nodes)
    }

    fn plan_coords_with(&self, from: GeoPoint, to: GeoPoint, rng: &mut SimRng) -> Route {
        self.router
            .route_coords(&self.graph, from, to, rng)
            .unwrap_or_else(|e| {
                debug!("no route {from} → {to}: {e}");
                Route::empty()
            })
    }

    fn plan_coords(&self, from: GeoPoint, to: GeoPoint) -> Route {
        let mut rng = lock(&self.rng);
        self.plan_coords_with(from, to, &mut rng)
    }

    // ── Request queue ─────────────────────────────────────────────────────

    /// Create a requester between two random connected nodes that have a
    /// route between them and enqueue it.
    ///
    /// Tries `1 + route_retries` endpoint pairs; returns `None` and enqueues
    /// nothing if all of them fail.
    pub fn intake(&self) -> Option<Requester> {
        let (name, pickup, dropoff) = {
            let mut rng = lock(&self.rng);
            let name = rng
                .choose(&self.config.requester_names)
                .cloned()
                .unwrap_or_else(|| "Requester".to_owned());
            let endpoints = self.random_routable_pair(&mut rng);
            match endpoints {
                Some((a, b)) => (name, a, b),
                None => {
                    warn!(
                        "intake: no route between random nodes after {} attempts; {name} not queued",
                        self.config.route_retries + 1
                    );
                    return None;
                }
            }
        };
        let requester = lock(&self.queue).enqueue_new(name, pickup, dropoff);
        debug!("intake: queued {} ({})", requester.name, requester.id);
        Some(requester)
    }

    fn random_routable_pair(&self, rng: &mut SimRng) -> Option<(GeoPoint, GeoPoint)> {
        for _ in 0..=self.config.route_retries {
            let a = self.graph.random_connected(rng)?;
            let b = self.graph.random_connected(rng)?;
            match self.router.route(&self.graph, a, b, rng) {
                Ok(route) if !route.is_empty() => return Some((self.graph.pos(a), self.graph.pos(b))),
                _ => {}
            }
        }
        None
    }

    /// The oldest waiting requester, left in the queue.
    pub fn peek_queue(&self) -> Option<Requester> {
        lock(&self.queue).peek().cloned()
    }

    /// Every waiting requester, oldest first.
    pub fn list_queue(&self) -> Vec<Requester> {
        lock(&self.queue).list()
    }

    // ── Pairing & assignment ──────────────────────────────────────────────

    /// Pair the queue head with the nearest available vehicle in `vehicles`.
    ///
    /// Selection only: nothing is bound and the queue is unchanged.  The
    /// head may be taken by someone else before a later [`assign`](Self::assign);
    /// use [`dispatch_next`](Self::dispatch_next) to select and commit in one
    /// step.
    pub fn pair(&self, vehicles: &[Vehicle]) -> Pairing {
        let head = self.peek_queue();
        self.matcher.pair(vehicles, head.as_ref())
    }

    /// Bind `requester` to the vehicle called `vehicle_name` and plan its
    /// pickup leg.
    ///
    /// On success the requester leaves the queue, the pickup leg is recorded
    /// in the heatmap, and the new route is returned.  An unknown or busy
    /// vehicle, a requester already bound elsewhere, or one no longer in the
    /// queue (a stale pairing for someone already served) is an error and
    /// changes nothing.
    pub fn assign(&self, vehicle_name: &str, requester: Requester) -> SimResult<Route> {
        let requester_id = requester.id;
        let mut fleet = lock(&self.fleet);
        let mut queue = lock(&self.queue);
        if !queue.contains(requester_id) && fleet.holder_of(requester_id).is_none() {
            return Err(DispatchError::NotQueued(requester_id).into());
        }
        let (_, route) = self.assign_locked(&mut fleet, vehicle_name, requester)?;
        queue.remove(requester_id);
        Ok(route)
    }

    /// Pair the queue head with the nearest available vehicle in the fleet
    /// and bind them, all under the fleet and queue locks.
    ///
    /// Returns `None` when the queue is empty or every vehicle is busy; the
    /// queue is then left as it was.
    pub fn dispatch_next(&self) -> SimResult<Option<Dispatch>> {
        let mut fleet = lock(&self.fleet);
        let mut queue = lock(&self.queue);

        let Some(head) = queue.peek().cloned() else {
            return Ok(None);
        };
        let Some(index) = self.matcher.select(fleet.vehicles(), &head) else {
            debug!("dispatch: no vehicle available for {}; {} waiting", head.name, queue.len());
            return Ok(None);
        };
        let vehicle_name = fleet.vehicles()[index].name.clone();
        let (vehicle, route) = self.assign_locked(&mut fleet, &vehicle_name, head.clone())?;
        queue.remove(head.id);

        Ok(Some(Dispatch { vehicle, vehicle_name, requester: head, route }))
    }

    fn assign_locked(
        &self,
        fleet: &mut FleetRegistry,
        vehicle_name: &str,
        requester: Requester,
    ) -> SimResult<(VehicleId, Route)> {
        let vehicle = fleet.assign_with(vehicle_name, requester, |from, r| self.plan_coords(from, r.pickup))?;
        vehicle.eta_minutes = self.eta.estimate_minutes(&self.graph, &vehicle.route.nodes);
        let route = vehicle.route.clone();

        if route.is_empty() {
            warn!("{vehicle_name}: no pickup route found; the pickup will complete in place");
        }
        if let Some(r) = &vehicle.requester {
            info!(
                "{vehicle_name} assigned {} ({}), {} nodes, eta {:.1} min",
                r.name,
                r.id,
                route.len(),
                vehicle.eta_minutes
            );
        }
        let id = vehicle.id;
        lock(&self.heatmap).record_route(&route.nodes);
        Ok((id, route))
    }

    // ── Fleet ─────────────────────────────────────────────────────────────

    /// Copies of every vehicle.
    pub fn list_vehicles(&self) -> Vec<Vehicle> {
        lock(&self.fleet).snapshot()
    }

    /// Create `count` vehicles named from `names`, each at a random
    /// connected node with a route to another random node.
    ///
    /// Idempotent: once a fleet exists further calls change nothing and
    /// return the existing fleet size.
    pub fn initialize_fleet(&self, names: &[&str], count: usize) -> SimResult<usize> {
        let now = self.now();
        let mut fleet = lock(&self.fleet);
        if !fleet.is_empty() {
            debug!("fleet already initialized with {} vehicles", fleet.len());
            return Ok(fleet.len());
        }
        if count > 0 && self.graph.connected_nodes().is_empty() {
            return Err(SimError::EmptyGraph);
        }

        let mut rng = lock(&self.rng);
        for name in roster_names(names, count) {
            let start = self.graph.random_connected(&mut rng).ok_or(SimError::EmptyGraph)?;
            let dest = self.graph.random_connected(&mut rng).ok_or(SimError::EmptyGraph)?;
            let route = self.router.route(&self.graph, start, dest, &mut rng).unwrap_or_default();

            let Some(id) = fleet.add(&name, self.graph.pos(start), self.config.fuel_capacity, self.config.initial_speed_kph)
            else {
                warn!("duplicate vehicle name {name:?}, skipping");
                continue;
            };
            if let Some(v) = fleet.get_mut(id) {
                v.eta_minutes = self.eta.estimate_minutes(&self.graph, &route.nodes);
                v.set_route(route);
                v.move_at = now;
            }
        }
        info!("initialized fleet of {} vehicles", fleet.len());
        Ok(fleet.len())
    }

    // ── Heatmap ───────────────────────────────────────────────────────────

    pub fn heatmap_snapshot(&self) -> Vec<HeatmapCell> {
        lock(&self.heatmap).snapshot()
    }

    /// Record one position visit.
    pub fn record_visit(&self, pos: GeoPoint) {
        lock(&self.heatmap).record(pos);
    }

    // ── Stepping ──────────────────────────────────────────────────────────

    /// Run one tick at instant `now` (the clock never moves backwards).
    pub fn tick_at(&self, now: SimTime) -> StepReport {
        self.tick_observed(now, &mut NoopObserver)
    }

    /// Advance the clock by `interval` and run one tick.
    pub fn advance(&self, interval: std::time::Duration) -> StepReport {
        let now = self.now() + interval;
        self.tick_at(now)
    }

    /// Run one tick at `now`, reporting to `observer`.
    pub fn tick_observed<O: SimObserver + ?Sized>(&self, now: SimTime, observer: &mut O) -> StepReport {
        let (now, tick) = {
            let mut clock = lock(&self.clock);
            clock.advance_to(now);
            (clock.now, clock.ticks)
        };
        observer.on_tick_start(now);

        let mut fleet = lock(&self.fleet);
        let report = {
            let mut rng = lock(&self.rng);
            self.stepper().step(fleet.vehicles_mut(), now, &mut rng)
        };

        if report.events.iter().any(|e| matches!(e, FleetEvent::PickedUp { .. })) {
            let mut heatmap = lock(&self.heatmap);
            for event in &report.events {
                if let FleetEvent::PickedUp { vehicle, .. } = *event {
                    if let Some(v) = fleet.get(vehicle) {
                        heatmap.record_route(&v.route.nodes);
                    }
                }
            }
        }

        for event in &report.events {
            log_event(&fleet, event);
            observer.on_event(now, event);
        }
        let interval = self.config.snapshot_interval_ticks;
        if interval > 0 && tick % interval == 0 {
            observer.on_snapshot(now, fleet.vehicles());
        }
        drop(fleet);

        observer.on_tick_end(now, &report);
        report
    }
}

fn log_event(fleet: &FleetRegistry, event: &FleetEvent) {
    let name = fleet.get(event.vehicle()).map_or("?", |v| v.name.as_str());
    match event {
        FleetEvent::PickedUp { requester, .. } => {
            info!("{name} picked up {requester}, heading to drop-off");
        }
        FleetEvent::DroppedOff { requester, .. } => {
            info!("{name} dropped off {requester}");
        }
        FleetEvent::Replanned { route_len, .. } => {
            debug!("{name} roaming along {route_len} nodes");
        }
        FleetEvent::Stranded { .. } => {
            warn!("{name}: no reachable destination, retrying later");
        }
    }
}

// ── EngineBuilder ─────────────────────────────────────────────────────────────

/// Fluent builder for [`FleetEngine<R, M>`].
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                          |
/// |-----------------|--------------------------------------------------|
/// | `.router(r)`    | `AStarRouter::from_config(&config)`              |
/// | `.matcher(m)`   | `NearestAvailable`                               |
/// | `.seed(s)`      | `config.seed`, else OS entropy                   |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(graph, EngineConfig::default())
///     .seed(42)
///     .build()?;
/// engine.initialize_fleet(&DEFAULT_VEHICLE_NAMES, 12)?;
/// ```
pub struct EngineBuilder<R: Router = AStarRouter, M: Matcher = NearestAvailable> {
    graph:   Arc<RoadGraph>,
    config:  EngineConfig,
    router:  R,
    matcher: M,
    seed:    Option<u64>,
}

impl EngineBuilder {
    pub fn new(graph: impl Into<Arc<RoadGraph>>, config: EngineConfig) -> Self {
        Self {
            graph:   graph.into(),
            router:  AStarRouter::from_config(&config),
            seed:    config.seed,
            config,
            matcher: NearestAvailable,
        }
    }
}

impl<R: Router, M: Matcher> EngineBuilder<R, M> {
    /// Replace the path finder.
    pub fn router<R2: Router>(self, router: R2) -> EngineBuilder<R2, M> {
        EngineBuilder {
            graph:   self.graph,
            config:  self.config,
            router,
            matcher: self.matcher,
            seed:    self.seed,
        }
    }

    /// Replace the pairing strategy.
    pub fn matcher<M2: Matcher>(self, matcher: M2) -> EngineBuilder<R, M2> {
        EngineBuilder {
            graph:   self.graph,
            config:  self.config,
            router:  self.router,
            matcher,
            seed:    self.seed,
        }
    }

    /// Fix the RNG seed, overriding `config.seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return a ready-to-run engine.
    pub fn build(self) -> SimResult<FleetEngine<R, M>> {
        self.config.validate()?;
        let heatmap = Heatmap::new(self.config.heatmap_decimals);
        Ok(FleetEngine {
            eta:     EtaEstimator::from_config(&self.config),
            clock:   Mutex::new(SimClock::new()),
            fleet:   Mutex::new(FleetRegistry::new()),
            queue:   Mutex::new(RequestQueue::new()),
            rng:     Mutex::new(SimRng::from_seed_opt(self.seed)),
            heatmap: Mutex::new(heatmap),
            graph:   self.graph,
            router:  self.router,
            matcher: self.matcher,
            config:  self.config,
        })
    }
}
