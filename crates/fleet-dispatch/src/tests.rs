//! Unit tests for fleet-dispatch.

use fleet_core::{GeoPoint, RequesterId, VehicleId};
use fleet_spatial::{Controls, RoadGraphBuilder, RoadNode, Route};

use crate::{
    roster_names, DispatchError, FleetRegistry, Heatmap, Matcher, NearestAvailable, RequestQueue,
    Requester, Vehicle, VehiclePhase,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn requester(id: u32, pickup: (f64, f64)) -> Requester {
    Requester::new(
        RequesterId(id),
        "Ryan",
        GeoPoint::new(pickup.0, pickup.1),
        GeoPoint::new(pickup.0 + 0.01, pickup.1),
    )
}

fn vehicle_at(id: u32, lat: f64, lon: f64) -> Vehicle {
    Vehicle::new(VehicleId(id), format!("v{id}"), GeoPoint::new(lat, lon), 40.0, 30.0)
}

/// A two-node route, taken from a real graph so the snapshots are valid.
fn two_node_route() -> Route {
    let mut b = RoadGraphBuilder::new();
    let x = b.add_node_with(1, GeoPoint::new(0.0, 0.0), Controls::NONE);
    let y = b.add_node_with(2, GeoPoint::new(0.0, 0.001), Controls::STOP);
    b.add_road(x, y, 111.0, Some(30.0));
    let graph = b.build();
    let nodes: Vec<RoadNode> = [x, y].iter().filter_map(|&n| graph.node(n)).collect();
    Route { nodes, search_cost_secs: 13.0 }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod vehicle {
    use super::*;

    #[test]
    fn new_vehicle_is_roaming_with_no_route() {
        let v = vehicle_at(0, 1.0, 2.0);
        assert_eq!(v.phase(), VehiclePhase::Roaming);
        assert!(v.is_available());
        assert!(!v.has_next_step());
        assert!(v.last_node().is_none());
        assert!(v.remaining_route().is_empty());
    }

    #[test]
    fn phases_follow_trip() {
        let mut v = vehicle_at(0, 0.0, 0.0);
        v.assign(requester(1, (0.0, 0.001)), two_node_route());
        assert_eq!(v.phase(), VehiclePhase::ToPickup);
        assert_eq!(v.destination, GeoPoint::new(0.0, 0.001));
        assert!(!v.is_available());

        v.begin_dropoff(Route::empty());
        assert_eq!(v.phase(), VehiclePhase::ToDropoff);
        assert_eq!(v.destination, GeoPoint::new(0.01, 0.001));

        let done = v.finish_trip().unwrap();
        assert_eq!(done.id, RequesterId(1));
        assert_eq!(v.phase(), VehiclePhase::Roaming);
    }

    #[test]
    fn route_progress_accessors() {
        let mut v = vehicle_at(0, 0.0, 0.0);
        v.set_route(two_node_route());
        assert_eq!(v.destination, GeoPoint::new(0.0, 0.001));
        assert_eq!(v.next_node().unwrap().source_id, 1);
        assert_eq!(v.remaining_route().len(), 2);

        v.route_index = 1;
        assert_eq!(v.last_node().unwrap().source_id, 1);
        assert_eq!(v.next_node().unwrap().source_id, 2);

        v.route_index = 2;
        assert!(!v.has_next_step());
        assert!(v.remaining_route().is_empty());
    }
}

// ── FleetRegistry ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod fleet {
    use super::*;

    fn fleet_of_two() -> FleetRegistry {
        let mut fleet = FleetRegistry::new();
        fleet.add("Foe", GeoPoint::new(0.0, 0.0), 40.0, 30.0).unwrap();
        fleet.add("Joe", GeoPoint::new(1.0, 1.0), 40.0, 30.0).unwrap();
        fleet
    }

    #[test]
    fn ids_follow_insertion_and_names_are_unique() {
        let mut fleet = fleet_of_two();
        assert_eq!(fleet.id_of("Joe"), Some(VehicleId(1)));
        assert!(fleet.add("Foe", GeoPoint::new(5.0, 5.0), 40.0, 30.0).is_none());
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.get(VehicleId(0)).unwrap().name, "Foe");
    }

    #[test]
    fn assign_binds_and_plans_from_vehicle_position() {
        let mut fleet = fleet_of_two();
        let v = fleet
            .assign_with("Joe", requester(7, (1.0, 1.001)), |from, r| {
                assert_eq!(from, GeoPoint::new(1.0, 1.0));
                assert_eq!(r.id, RequesterId(7));
                two_node_route()
            })
            .unwrap();
        assert_eq!(v.phase(), VehiclePhase::ToPickup);
        assert_eq!(v.route.len(), 2);
        assert_eq!(fleet.available_count(), 1);
        assert_eq!(fleet.holder_of(RequesterId(7)).unwrap().name, "Joe");
    }

    #[test]
    fn assign_unknown_vehicle_changes_nothing() {
        let mut fleet = fleet_of_two();
        let result = fleet.assign_with("Nobody", requester(1, (0.0, 0.0)), |_, _| {
            panic!("must not plan for an unknown vehicle")
        });
        assert!(matches!(result, Err(DispatchError::UnknownVehicle(_))));
        assert_eq!(fleet.available_count(), 2);
    }

    #[test]
    fn assigning_twice_is_rejected() {
        let mut fleet = fleet_of_two();
        fleet.assign_with("Foe", requester(3, (0.0, 0.0)), |_, _| Route::empty()).unwrap();

        let again = fleet.assign_with("Joe", requester(3, (0.0, 0.0)), |_, _| Route::empty());
        assert!(matches!(again, Err(DispatchError::AlreadyAssigned { .. })));
        assert!(fleet.get(VehicleId(1)).unwrap().is_available());

        let busy = fleet.assign_with("Foe", requester(4, (0.0, 0.0)), |_, _| Route::empty());
        assert!(matches!(busy, Err(DispatchError::VehicleBusy(_))));
        assert_eq!(fleet.get(VehicleId(0)).unwrap().requester.as_ref().unwrap().id, RequesterId(3));
    }

    #[test]
    fn roster_names_cycle_with_suffix() {
        let names = roster_names(&["Foe", "Joe"], 5);
        assert_eq!(names, vec!["Foe", "Joe", "Foe 2", "Joe 2", "Foe 3"]);
        assert_eq!(roster_names(&[], 2), vec!["Vehicle 1", "Vehicle 2"]);
        assert!(roster_names(&["Foe"], 0).is_empty());
    }
}

// ── RequestQueue ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod queue {
    use super::*;

    #[test]
    fn fifo_with_peek() {
        let mut q = RequestQueue::new();
        assert!(q.peek().is_none());
        let a = q.enqueue_new("Luke", GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0));
        let b = q.enqueue_new("Jess", GeoPoint::new(2.0, 2.0), GeoPoint::new(3.0, 3.0));
        assert_eq!(q.peek().unwrap().id, a.id);
        assert_eq!(q.len(), 2);
        assert_eq!(q.list().iter().map(|r| r.id).collect::<Vec<_>>(), vec![a.id, b.id]);
    }

    #[test]
    fn ids_never_repeat() {
        let mut q = RequestQueue::new();
        let a = q.enqueue_new("Bob", GeoPoint::default(), GeoPoint::default());
        q.remove(a.id).unwrap();
        let b = q.enqueue_new("Bob", GeoPoint::default(), GeoPoint::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn remove_from_middle() {
        let mut q = RequestQueue::new();
        let ids: Vec<_> = (0..3)
            .map(|_| q.enqueue_new("Nancy", GeoPoint::default(), GeoPoint::default()).id)
            .collect();
        assert!(q.remove(ids[1]).is_some());
        assert!(q.remove(ids[1]).is_none());
        assert!(!q.contains(ids[1]));
        assert_eq!(q.list().iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
    }
}

// ── Matcher ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod matcher {
    use super::*;

    #[test]
    fn empty_queue_yields_sentinel() {
        let vehicles = vec![vehicle_at(0, 0.0, 0.0)];
        let pairing = NearestAvailable.pair(&vehicles, None);
        assert_eq!(pairing.as_index(), -1);
        assert!(pairing.requester.is_none());
    }

    #[test]
    fn nearest_by_manhattan_distance() {
        let vehicles = vec![
            vehicle_at(0, 0.0, 3.0),  // L1 = 3.0
            vehicle_at(1, 1.5, 1.5),  // L1 = 3.0, Euclidean is shorter
            vehicle_at(2, 0.0, 2.5),  // L1 = 2.5
        ];
        let r = requester(1, (0.0, 0.0));
        let pairing = NearestAvailable.pair(&vehicles, Some(&r));
        assert_eq!(pairing.vehicle, Some(2));
        assert_eq!(pairing.requester.unwrap().id, RequesterId(1));
    }

    #[test]
    fn busy_vehicles_skipped_and_ties_take_lower_index() {
        let mut vehicles = vec![vehicle_at(0, 0.0, 0.1), vehicle_at(1, 0.0, 1.0), vehicle_at(2, 0.0, -1.0)];
        vehicles[0].assign(requester(9, (0.0, 0.1)), Route::empty());
        let r = requester(1, (0.0, 0.0));
        assert_eq!(NearestAvailable.select(&vehicles, &r), Some(1));
    }

    #[test]
    fn all_busy_is_none() {
        let mut vehicles = vec![vehicle_at(0, 0.0, 0.0)];
        vehicles[0].assign(requester(9, (0.0, 0.0)), Route::empty());
        let r = requester(1, (0.0, 0.0));
        let pairing = NearestAvailable.pair(&vehicles, Some(&r));
        assert_eq!(pairing.as_index(), -1);
        assert!(pairing.requester.is_some());
    }
}

// ── Heatmap ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod heatmap {
    use super::*;

    #[test]
    fn near_duplicates_share_a_cell() {
        let mut h = Heatmap::new(5);
        h.record(GeoPoint::new(37.774_901, -122.419_402));
        h.record(GeoPoint::new(37.774_904, -122.419_398));
        assert_eq!(h.len(), 1);
        assert_eq!(h.count_at(GeoPoint::new(37.774_90, -122.419_40)), 2);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn record_route_counts_each_node() {
        let mut h = Heatmap::default();
        let route = two_node_route();
        h.record_route(&route.nodes);
        h.record_route(&route.nodes);
        assert_eq!(h.len(), 2);
        assert_eq!(h.total(), 4);
        assert_eq!(h.count_at(GeoPoint::new(0.0, 0.001)), 2);
    }

    #[test]
    fn snapshot_sorted_and_monotonic() {
        let mut h = Heatmap::new(3);
        h.record(GeoPoint::new(1.0, 5.0));
        h.record(GeoPoint::new(0.5, 9.0));
        h.record(GeoPoint::new(1.0, 4.0));
        let first = h.snapshot();
        let coords: Vec<_> = first.iter().map(|c| (c.lat, c.lon)).collect();
        assert_eq!(coords, vec![(0.5, 9.0), (1.0, 4.0), (1.0, 5.0)]);

        h.record(GeoPoint::new(1.0, 4.0));
        let second = h.snapshot();
        for (a, b) in first.iter().zip(&second) {
            assert!(b.count >= a.count);
        }
        assert_eq!(second[1].count, 2);
    }
}
