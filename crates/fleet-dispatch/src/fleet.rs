//! The fleet registry: a fixed roster of vehicles with name lookup.

use rustc_hash::FxHashMap;

use fleet_core::{GeoPoint, RequesterId, VehicleId};
use fleet_spatial::Route;

use crate::{DispatchError, DispatchResult, Requester, Vehicle};

/// All vehicles, indexed by `VehicleId`.
///
/// Vehicles are only ever appended, so a `VehicleId` stays valid for the
/// registry's lifetime and equals the vehicle's position in
/// [`vehicles`](Self::vehicles).
#[derive(Debug, Default)]
pub struct FleetRegistry {
    vehicles: Vec<Vehicle>,
    by_name:  FxHashMap<String, VehicleId>,
}

impl FleetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Append a parked vehicle.  Returns `None` if the name is taken.
    pub fn add(&mut self, name: &str, pos: GeoPoint, fuel: f64, speed_kph: f64) -> Option<VehicleId> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let id = VehicleId(self.vehicles.len() as u32);
        self.vehicles.push(Vehicle::new(id, name, pos, fuel, speed_kph));
        self.by_name.insert(name.to_owned(), id);
        Some(id)
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.index())
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.index())
    }

    pub fn id_of(&self, name: &str) -> Option<VehicleId> {
        self.by_name.get(name).copied()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    /// Owned copy of every vehicle, for handing out past a lock.
    pub fn snapshot(&self) -> Vec<Vehicle> {
        self.vehicles.clone()
    }

    /// The vehicle currently carrying or fetching `requester`, if any.
    pub fn holder_of(&self, requester: RequesterId) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|v| v.requester.as_ref().is_some_and(|r| r.id == requester))
    }

    pub fn available_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.is_available()).count()
    }

    /// Bind `requester` to the vehicle called `name`.
    ///
    /// Fails without changing anything if the vehicle does not exist, is
    /// already busy, or the requester is already bound to some vehicle.
    /// `plan` is called only once every check has passed, with the
    /// vehicle's current position, and returns the pickup route.
    pub fn assign_with(
        &mut self,
        name: &str,
        requester: Requester,
        plan: impl FnOnce(GeoPoint, &Requester) -> Route,
    ) -> DispatchResult<&mut Vehicle> {
        let id = self
            .id_of(name)
            .ok_or_else(|| DispatchError::UnknownVehicle(name.to_owned()))?;
        if let Some(holder) = self.holder_of(requester.id) {
            return Err(DispatchError::AlreadyAssigned {
                requester: requester.id,
                vehicle:   holder.name.clone(),
            });
        }
        let vehicle = &mut self.vehicles[id.index()];
        if !vehicle.is_available() {
            return Err(DispatchError::VehicleBusy(name.to_owned()));
        }
        let route = plan(vehicle.pos, &requester);
        vehicle.assign(requester, route);
        Ok(vehicle)
    }
}

/// Names handed out by the demo and by callers without a roster of their own.
pub const DEFAULT_VEHICLE_NAMES: [&str; 12] =
    ["Foe", "Joe", "Poe", "Doe", "Bow", "Crow", "Low", "Bro", "Flow", "Row", "Glo", "Oh"];

/// `count` distinct vehicle names drawn from `names` in order.
///
/// Once the list is exhausted it is reused with a numeric suffix
/// (`Foe`, `Joe`, ..., `Foe 2`, `Joe 2`, ...).  An empty list yields
/// `Vehicle 1`, `Vehicle 2`, ...
pub fn roster_names(names: &[&str], count: usize) -> Vec<String> {
    if names.is_empty() {
        return (1..=count).map(|i| format!("Vehicle {i}")).collect();
    }
    (0..count)
        .map(|i| {
            let base = names[i % names.len()];
            match i / names.len() {
                0     => base.to_owned(),
                round => format!("{base} {}", round + 1),
            }
        })
        .collect()
}
