//! Per-vehicle live state.

use serde::Serialize;

use fleet_core::{GeoPoint, SimTime, VehicleId};
use fleet_spatial::{RoadNode, Route};

use crate::Requester;

/// Trip phase, derived from a vehicle's requester and leg flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum VehiclePhase {
    /// No requester; driving to random destinations.
    Roaming,
    /// Driving to the requester's pickup point.
    ToPickup,
    /// Carrying the requester to the drop-off point.
    ToDropoff,
}

/// One vehicle in the fleet.
///
/// Vehicles are created once at fleet initialization and never removed.
/// The stepper overwrites position, route progress, fuel, speed and the two
/// timestamps; assignment overwrites the requester and route.
#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    pub id:   VehicleId,
    pub name: String,

    /// Current position.  Always the last route node reached, or the
    /// spawn position before the first step.
    pub pos: GeoPoint,

    /// Target of the current leg.
    pub destination: GeoPoint,

    pub requester: Option<Requester>,

    /// `true` while driving to a requester's pickup point.
    pub on_pickup_leg: bool,

    pub route: Route,

    /// Index of the next route node to move to.  `route.len()` when the
    /// route is complete.
    pub route_index: usize,

    /// Remaining fuel.  Refilled to capacity when it would reach zero.
    pub fuel: f64,

    /// Speed used for the most recent edge, in km/h.
    pub speed_kph: f64,

    /// Earliest time the stepper may move this vehicle again.
    pub move_at: SimTime,

    /// When the visual transition to `pos` finishes.  Cosmetic only.
    pub animation_at: SimTime,

    /// Expected minutes to finish the current route.
    pub eta_minutes: f64,
}

impl Vehicle {
    /// A parked vehicle at `pos` with no route.
    pub fn new(id: VehicleId, name: impl Into<String>, pos: GeoPoint, fuel: f64, speed_kph: f64) -> Self {
        Self {
            id,
            name:          name.into(),
            pos,
            destination:   pos,
            requester:     None,
            on_pickup_leg: false,
            route:         Route::empty(),
            route_index:   0,
            fuel,
            speed_kph,
            move_at:       SimTime::ZERO,
            animation_at:  SimTime::ZERO,
            eta_minutes:   0.0,
        }
    }

    pub fn phase(&self) -> VehiclePhase {
        match (&self.requester, self.on_pickup_leg) {
            (None, _)        => VehiclePhase::Roaming,
            (Some(_), true)  => VehiclePhase::ToPickup,
            (Some(_), false) => VehiclePhase::ToDropoff,
        }
    }

    /// `true` if the vehicle can take a new requester.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.requester.is_none()
    }

    /// `true` while there are route nodes left to move to.
    #[inline]
    pub fn has_next_step(&self) -> bool {
        self.route_index < self.route.len()
    }

    /// The next route node, if any.
    pub fn next_node(&self) -> Option<&RoadNode> {
        self.route.nodes.get(self.route_index)
    }

    /// The route node the vehicle last reached, if it has moved along the
    /// current route at all.
    pub fn last_node(&self) -> Option<&RoadNode> {
        self.route_index.checked_sub(1).and_then(|i| self.route.nodes.get(i))
    }

    /// Route nodes not yet reached.
    pub fn remaining_route(&self) -> &[RoadNode] {
        let start = self.route_index.min(self.route.len());
        &self.route.nodes[start..]
    }

    /// Replace the route and restart progress along it.
    pub fn set_route(&mut self, route: Route) {
        if let Some(last) = route.last() {
            self.destination = last.pos;
        }
        self.route = route;
        self.route_index = 0;
    }

    /// Bind `requester` and start the pickup leg along `pickup_route`.
    pub fn assign(&mut self, requester: Requester, pickup_route: Route) {
        self.destination = requester.pickup;
        self.requester = Some(requester);
        self.on_pickup_leg = true;
        self.route = pickup_route;
        self.route_index = 0;
    }

    /// Start the drop-off leg along `dropoff_route`.
    pub fn begin_dropoff(&mut self, dropoff_route: Route) {
        if let Some(r) = &self.requester {
            self.destination = r.dropoff;
        }
        self.on_pickup_leg = false;
        self.route = dropoff_route;
        self.route_index = 0;
    }

    /// Release the requester, returning it.
    pub fn finish_trip(&mut self) -> Option<Requester> {
        self.on_pickup_leg = false;
        self.requester.take()
    }
}
