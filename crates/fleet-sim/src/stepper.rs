//! The simulation stepper: one pass over the fleet at a given instant.
//!
//! # Per-vehicle rules
//!
//! ```text
//! now < move_at           → skip
//! route has nodes left    → advance one node (jittered speed, fuel, pause)
//! route complete:
//!   ToPickup              → plan drop-off leg from here      [PickedUp]
//!   ToDropoff             → release requester, roam          [DroppedOff]
//!   Roaming               → roam                             [Replanned]
//!   (no roam route found) → retry after `idle_retry_secs`    [Stranded]
//! ```
//!
//! After any completion that produced a route the vehicle rests for
//! `settle_secs` and its ETA is recomputed.
//!
//! The stepper holds no state of its own and takes no locks.  Everything it
//! needs is borrowed for the duration of [`Stepper::step`], and every
//! random draw comes from the `SimRng` passed in, so a seeded run is
//! reproducible.

use fleet_core::{EngineConfig, GeoPoint, RequesterId, SimRng, SimTime, VehicleId};
use fleet_dispatch::{Vehicle, VehiclePhase};
use fleet_spatial::{EtaEstimator, RoadGraph, Route, Router};

// ── Step output ───────────────────────────────────────────────────────────────

/// A trip-level state change produced by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum FleetEvent {
    /// Pickup leg finished; the vehicle's route is now the drop-off leg.
    PickedUp { vehicle: VehicleId, requester: RequesterId },
    /// Drop-off leg finished; the requester has left the vehicle.
    DroppedOff { vehicle: VehicleId, requester: RequesterId },
    /// A roaming vehicle got a new random destination.
    Replanned { vehicle: VehicleId, route_len: usize },
    /// No reachable destination was found; the vehicle will retry later.
    Stranded { vehicle: VehicleId },
}

impl FleetEvent {
    pub fn vehicle(&self) -> VehicleId {
        match *self {
            FleetEvent::PickedUp { vehicle, .. }
            | FleetEvent::DroppedOff { vehicle, .. }
            | FleetEvent::Replanned { vehicle, .. }
            | FleetEvent::Stranded { vehicle } => vehicle,
        }
    }
}

/// Summary of one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub now:    SimTime,
    /// Vehicles that advanced one route node.
    pub moved:  usize,
    /// Vehicles whose `move_at` had not arrived.
    pub waiting: usize,
    pub events: Vec<FleetEvent>,
}

// ── Stepper ───────────────────────────────────────────────────────────────────

/// Borrowed view of everything one step needs.
pub struct Stepper<'a, R: Router> {
    pub graph:  &'a RoadGraph,
    pub router: &'a R,
    pub eta:    &'a EtaEstimator,
    pub config: &'a EngineConfig,
}

impl<'a, R: Router> Stepper<'a, R> {
    pub fn new(graph: &'a RoadGraph, router: &'a R, eta: &'a EtaEstimator, config: &'a EngineConfig) -> Self {
        Self { graph, router, eta, config }
    }

    /// Advance every vehicle in `vehicles` to instant `now`.
    pub fn step(&self, vehicles: &mut [Vehicle], now: SimTime, rng: &mut SimRng) -> StepReport {
        let mut report = StepReport { now, ..StepReport::default() };
        for vehicle in vehicles.iter_mut() {
            if now < vehicle.move_at {
                report.waiting += 1;
                continue;
            }
            if vehicle.has_next_step() {
                self.advance(vehicle, now, rng);
                report.moved += 1;
            } else {
                report.events.push(self.complete(vehicle, now, rng));
            }
        }
        report
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Move to the next route node and schedule the following move.
    fn advance(&self, vehicle: &mut Vehicle, now: SimTime, rng: &mut SimRng) {
        let cfg = self.config;
        let Some(&next) = vehicle.next_node() else {
            return;
        };

        // The first step starts from wherever the vehicle is, which need
        // not be a graph node; later steps follow a real edge.
        let (from_pos, posted_kph) = match vehicle.last_node() {
            Some(prev) => {
                let speed = self
                    .graph
                    .find_edge(prev.id, next.id)
                    .and_then(|e| self.graph.edge_speed_kph(e));
                (prev.pos, speed)
            }
            None => (vehicle.pos, None),
        };
        let distance_m = from_pos.distance_m(next.pos);

        let jitter = rng.uniform(cfg.speed_jitter_min, cfg.speed_jitter_max);
        let mut speed_kph = posted_kph.unwrap_or(0.0) * jitter;
        if !(speed_kph > 0.0) {
            speed_kph = cfg.fallback_speed_kph;
        }

        vehicle.pos = next.pos;
        vehicle.route_index += 1;
        vehicle.speed_kph = speed_kph;

        vehicle.fuel -= distance_m * cfg.fuel_per_meter;
        if vehicle.fuel <= 0.0 {
            vehicle.fuel = cfg.fuel_capacity;
        }

        let travel_secs = distance_m / (speed_kph / 3.6);
        let delay = &cfg.step_delay;
        let pause_secs = if next.traffic_light && rng.gen_bool(delay.light_probability) {
            delay.light_delay_secs
        } else if next.stop_sign && rng.gen_bool(delay.stop_probability) {
            delay.stop_delay_secs
        } else {
            0.0
        };

        vehicle.animation_at = now.after_secs(travel_secs);
        vehicle.move_at = now.after_secs(travel_secs + pause_secs);
    }

    // ── Route completion ──────────────────────────────────────────────────

    fn complete(&self, vehicle: &mut Vehicle, now: SimTime, rng: &mut SimRng) -> FleetEvent {
        let id = vehicle.id;
        let event = match vehicle.phase() {
            VehiclePhase::ToPickup => {
                let (requester, dropoff) = match &vehicle.requester {
                    Some(r) => (r.id, r.dropoff),
                    None => (RequesterId::INVALID, vehicle.pos),
                };
                let route = self.plan_between(vehicle.pos, dropoff, rng);
                vehicle.begin_dropoff(route);
                FleetEvent::PickedUp { vehicle: id, requester }
            }
            VehiclePhase::ToDropoff => {
                let requester = vehicle.finish_trip().map_or(RequesterId::INVALID, |r| r.id);
                let route = self.roam(vehicle.pos, rng).unwrap_or_default();
                vehicle.set_route(route);
                FleetEvent::DroppedOff { vehicle: id, requester }
            }
            VehiclePhase::Roaming => match self.roam(vehicle.pos, rng) {
                Some(route) => {
                    let route_len = route.len();
                    vehicle.set_route(route);
                    FleetEvent::Replanned { vehicle: id, route_len }
                }
                None => {
                    vehicle.move_at = now.after_secs(self.config.idle_retry_secs);
                    return FleetEvent::Stranded { vehicle: id };
                }
            },
        };

        vehicle.move_at = now.after_secs(self.config.settle_secs);
        vehicle.eta_minutes = self.eta.estimate_minutes(self.graph, &vehicle.route.nodes);
        event
    }

    /// Route between two coordinates, or an empty route when none exists.
    fn plan_between(&self, from: GeoPoint, to: GeoPoint, rng: &mut SimRng) -> Route {
        self.router
            .route_coords(self.graph, from, to, rng)
            .unwrap_or_default()
    }

    /// A route from the routable node nearest `pos` to a random connected
    /// node, trying fresh destinations up to `route_retries` extra times.
    pub fn roam(&self, pos: GeoPoint, rng: &mut SimRng) -> Option<Route> {
        let start = self.graph.nearest_routable(pos)?;
        for _ in 0..=self.config.route_retries {
            let dest = self.graph.random_connected(rng)?;
            if let Ok(route) = self.router.route(self.graph, start, dest, rng) {
                if !route.is_empty() {
                    return Some(route);
                }
            }
        }
        None
    }
}
