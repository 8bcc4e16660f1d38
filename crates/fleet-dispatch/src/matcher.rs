//! Pairing the head of the request queue with a vehicle.
//!
//! Pairing only *selects*; binding the requester to the vehicle is a
//! separate assignment step.

use serde::Serialize;

use crate::{Requester, Vehicle};

/// Result of a pairing attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pairing {
    /// Index into the vehicle slice that was searched.
    pub vehicle:   Option<usize>,
    /// The requester that was paired against (the queue head).
    pub requester: Option<Requester>,
}

impl Pairing {
    pub fn none() -> Self {
        Self { vehicle: None, requester: None }
    }

    /// Vehicle index, or `-1` when no vehicle is available.
    pub fn as_index(&self) -> isize {
        self.vehicle.map_or(-1, |i| i as isize)
    }
}

/// Chooses a vehicle for a requester.
pub trait Matcher: Send + Sync {
    /// Index of the chosen vehicle in `vehicles`, or `None` if no vehicle
    /// can take `requester`.
    fn select(&self, vehicles: &[Vehicle], requester: &Requester) -> Option<usize>;

    /// Pair `vehicles` against the queue head `head`.  An empty queue never
    /// yields a vehicle.
    fn pair(&self, vehicles: &[Vehicle], head: Option<&Requester>) -> Pairing {
        match head {
            None => Pairing::none(),
            Some(r) => Pairing {
                vehicle:   self.select(vehicles, r),
                requester: Some(r.clone()),
            },
        }
    }
}

/// Greedy nearest-available matcher.
///
/// Distance is Manhattan distance in degree space between the vehicle's
/// position and the pickup point.  Vehicles that already have a requester
/// are skipped; on a tie the lower index wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestAvailable;

impl Matcher for NearestAvailable {
    fn select(&self, vehicles: &[Vehicle], requester: &Requester) -> Option<usize> {
        vehicles
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_available())
            .map(|(i, v)| (i, v.pos.manhattan_deg(requester.pickup)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(i, _)| i)
    }
}
