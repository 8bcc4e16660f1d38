//! Unit tests for fleet-spatial.
//!
//! All tests use hand-crafted graphs so they run without any map file.

#[cfg(test)]
mod helpers {
    use fleet_core::{GeoPoint, NodeId};

    use crate::{Controls, RoadGraph, RoadGraphBuilder};

    /// Three nodes in a row, A(0,0) - B(0,1) - C(0,2), two-way roads of
    /// 1000 m at 36 km/h (10 m/s).  `c_controls` decorates node C.
    pub fn line_graph(c_controls: Controls) -> (RoadGraph, [NodeId; 3]) {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node_with(10, GeoPoint::new(0.0, 0.0), Controls::NONE);
        let m = b.add_node_with(11, GeoPoint::new(0.0, 1.0), Controls::NONE);
        let c = b.add_node_with(12, GeoPoint::new(0.0, 2.0), c_controls);
        b.add_road(a, m, 1_000.0, Some(36.0));
        b.add_road(m, c, 1_000.0, Some(36.0));
        (b.build(), [a, m, c])
    }

    /// Small grid:
    ///
    /// ```text
    ///   3:(1,0) ───────── 4:(1,2)
    ///     │                 │
    ///   0:(0,0) ─ 1:(0,1) ─ 2:(0,2)
    /// ```
    ///
    /// At 36 km/h: 0→1→2→4 costs 30 s, 0→3→4 costs 60 s.
    pub fn grid_graph() -> (RoadGraph, [NodeId; 5]) {
        let mut b = RoadGraphBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.0, 1.0));
        let n2 = b.add_node(GeoPoint::new(0.0, 2.0));
        let n3 = b.add_node(GeoPoint::new(1.0, 0.0));
        let n4 = b.add_node(GeoPoint::new(1.0, 2.0));

        b.add_road(n0, n1, 100.0, Some(36.0)); // 10 s
        b.add_road(n1, n2, 100.0, Some(36.0)); // 10 s
        b.add_road(n2, n4, 100.0, Some(36.0)); // 10 s
        b.add_road(n0, n3, 500.0, Some(36.0)); // 50 s
        b.add_road(n3, n4, 100.0, Some(36.0)); // 10 s

        (b.build(), [n0, n1, n2, n3, n4])
    }

    pub const GRAPH_JSON: &str = r#"{
        "100": { "id": 100, "lat": 37.0, "lon": -122.0, "traffic_light": true,
                 "neighbors": { "101": { "distance": 150.0, "speed": 50.0 } } },
        "101": { "id": 101, "lat": 37.001, "lon": -122.0, "stop_sign": true,
                 "neighbors": { "100": { "distance": 150.0, "speed": 50.0 },
                                "102": { "distance": 200.0 },
                                "999": { "distance": 10.0 } } },
        "102": { "id": 102, "lat": 37.002, "lon": -122.001,
                 "neighbors": { "101": { "distance": 200.0, "speed": 0.0 } } }
    }"#;
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use fleet_core::GeoPoint;

    use super::helpers::{grid_graph, line_graph};
    use crate::{Controls, RoadGraph, RoadGraphBuilder};

    #[test]
    fn empty_build() {
        let graph = RoadGraph::empty();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.is_empty());
        assert!(graph.connected_nodes().is_empty());
    }

    #[test]
    fn counts_and_degrees() {
        let (graph, [n0, n1, _, n3, _]) = grid_graph();
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 10);
        assert_eq!(graph.out_degree(n0), 2);
        assert_eq!(graph.out_degree(n1), 2);
        assert_eq!(graph.out_degree(n3), 2);
    }

    #[test]
    fn csr_edges_leave_their_node() {
        let (graph, nodes) = grid_graph();
        for &n in &nodes {
            for e in graph.out_edges(n) {
                assert_eq!(graph.edge_from(e), n);
            }
        }
    }

    #[test]
    fn find_edge_and_neighbors() {
        let (graph, [a, b, c]) = line_graph(Controls::NONE);
        let e = graph.find_edge(a, b).unwrap();
        assert_eq!(graph.edge_to(e), b);
        assert_eq!(graph.edge_length_m(e), 1_000.0);
        assert!(graph.find_edge(a, c).is_none());

        let mut around_b: Vec<_> = graph.neighbors(b).map(|(n, _)| n).collect();
        around_b.sort();
        assert_eq!(around_b, vec![a, c]);
    }

    #[test]
    fn node_snapshot_carries_controls() {
        let (graph, [_, _, c]) = line_graph(Controls::LIGHT);
        let node = graph.node(c).unwrap();
        assert_eq!(node.source_id, 12);
        assert!(node.traffic_light);
        assert!(!node.stop_sign);
        assert_eq!(graph.node_by_source_id(12), Some(c));
        assert!(graph.node(fleet_core::NodeId(99)).is_none());
    }

    #[test]
    fn effective_speed_falls_back() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 0.001));
        b.add_directed_edge(x, y, 100.0, None);
        b.add_directed_edge(y, x, 100.0, Some(-5.0));
        let graph = b.build();

        let xy = graph.find_edge(x, y).unwrap();
        let yx = graph.find_edge(y, x).unwrap();
        assert_eq!(graph.effective_speed_kph(xy, 40.0), 40.0);
        assert_eq!(graph.effective_speed_kph(yx, 40.0), 40.0);
        assert_eq!(graph.max_speed_kph(), 0.0);
    }

    #[test]
    fn connected_excludes_isolated_nodes() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 0.001));
        let _lonely = b.add_node(GeoPoint::new(1.0, 1.0));
        b.add_directed_edge(x, y, 100.0, Some(30.0));
        let graph = b.build();
        assert_eq!(graph.connected_nodes(), &[x]);

        let mut rng = fleet_core::SimRng::new(3);
        for _ in 0..20 {
            assert_eq!(graph.random_connected(&mut rng), Some(x));
        }
    }
}

// ── Spatial snapping ──────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use fleet_core::GeoPoint;

    use super::helpers::{grid_graph, line_graph};
    use crate::{Controls, RoadGraphBuilder};

    #[test]
    fn skips_dead_ends() {
        // A and C have one neighbour each; only B is routable.
        let (graph, [_, b, _]) = line_graph(Controls::NONE);
        assert_eq!(graph.nearest_routable(GeoPoint::new(0.0, 0.0)), Some(b));
        assert_eq!(graph.nearest_routable(GeoPoint::new(0.0, 2.1)), Some(b));
    }

    #[test]
    fn picks_nearest_routable() {
        let (graph, [n0, _, _, _, n4]) = grid_graph();
        assert_eq!(graph.nearest_routable(GeoPoint::new(0.1, -0.1)), Some(n0));
        assert_eq!(graph.nearest_routable(GeoPoint::new(1.05, 2.2)), Some(n4));
    }

    #[test]
    fn result_always_has_two_neighbours() {
        let (graph, _) = grid_graph();
        for lat in [-1.0, 0.3, 0.7, 2.0] {
            for lon in [-1.0, 0.5, 1.5, 3.0] {
                let n = graph.nearest_routable(GeoPoint::new(lat, lon)).unwrap();
                assert!(graph.out_degree(n) >= 2);
            }
        }
    }

    #[test]
    fn none_when_nothing_routable() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 0.001));
        b.add_road(x, y, 100.0, None);
        let graph = b.build();
        assert_eq!(graph.nearest_routable(GeoPoint::new(0.0, 0.0)), None);
    }
}

// ── JSON loader ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Write;

    use super::helpers::GRAPH_JSON;
    use crate::{load_graph_json, parse_graph_str, SpatialError};

    #[test]
    fn round_trip_positions_and_flags() {
        let graph = parse_graph_str(GRAPH_JSON).unwrap();
        assert_eq!(graph.node_count(), 3);

        let n100 = graph.node(graph.node_by_source_id(100).unwrap()).unwrap();
        assert_eq!((n100.pos.lat, n100.pos.lon), (37.0, -122.0));
        assert!(n100.traffic_light && !n100.stop_sign);

        let n101 = graph.node(graph.node_by_source_id(101).unwrap()).unwrap();
        assert_eq!((n101.pos.lat, n101.pos.lon), (37.001, -122.0));
        assert!(!n101.traffic_light && n101.stop_sign);
    }

    #[test]
    fn ids_assigned_in_source_order() {
        let graph = parse_graph_str(GRAPH_JSON).unwrap();
        let ids: Vec<i64> = (0..3).map(|i| graph.source_id(fleet_core::NodeId(i))).collect();
        assert_eq!(ids, vec![100, 101, 102]);
    }

    #[test]
    fn unknown_neighbour_skipped() {
        let graph = parse_graph_str(GRAPH_JSON).unwrap();
        // 100→101, 101→100, 101→102, 102→101; the 999 entry is dropped.
        assert_eq!(graph.edge_count(), 4);
        let n101 = graph.node_by_source_id(101).unwrap();
        let n102 = graph.node_by_source_id(102).unwrap();
        let e = graph.find_edge(n101, n102).unwrap();
        assert_eq!(graph.edge_speed_kph(e), None);
        assert_eq!(graph.edge_length_m(e), 200.0);
    }

    #[test]
    fn key_id_mismatch_is_malformed() {
        let json = r#"{ "1": { "id": 2, "lat": 0.0, "lon": 0.0 } }"#;
        assert!(matches!(parse_graph_str(json), Err(SpatialError::Malformed(_))));
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(parse_graph_str("{ \"1\": "), Err(SpatialError::Json(_))));
        assert!(matches!(parse_graph_str(r#"{ "1": { "id": 1 } }"#), Err(SpatialError::Json(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GRAPH_JSON.as_bytes()).unwrap();
        let graph = load_graph_json(file.path()).unwrap();
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_graph_json(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SpatialError::Io(_))));
    }
}

// ── A* path finder ────────────────────────────────────────────────────────────

#[cfg(test)]
mod astar {
    use fleet_core::{EngineConfig, GeoPoint, Heuristic, NodeId, SimRng};

    use super::helpers::{grid_graph, line_graph};
    use crate::{AStarRouter, Controls, RoadGraphBuilder, Router, SampledTravelTime, SpatialError};

    fn deterministic(heuristic: Heuristic) -> AStarRouter {
        AStarRouter::new(SampledTravelTime::deterministic(40.0), heuristic)
    }

    #[test]
    fn line_scenario() {
        let (graph, [a, b, c]) = line_graph(Controls::NONE);
        let route = deterministic(Heuristic::DegreeDistance)
            .route(&graph, a, c, &mut SimRng::new(0))
            .unwrap();
        assert_eq!(route.node_ids().collect::<Vec<_>>(), vec![a, b, c]);
        assert!((route.search_cost_secs - 200.0).abs() < 1e-9);
    }

    #[test]
    fn grid_shortest_path_all_heuristics() {
        let (graph, [n0, n1, n2, _, n4]) = grid_graph();
        let max = Heuristic::TravelTime { max_speed_kph: 36.0 };
        for h in [Heuristic::DegreeDistance, max, Heuristic::Zero] {
            let route = deterministic(h.clone()).route(&graph, n0, n4, &mut SimRng::new(0)).unwrap();
            assert_eq!(route.node_ids().collect::<Vec<_>>(), vec![n0, n1, n2, n4], "{h:?}");
            assert!((route.search_cost_secs - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn endpoints_are_first_and_last() {
        let (graph, nodes) = grid_graph();
        let router = deterministic(Heuristic::DegreeDistance);
        let mut rng = SimRng::new(0);
        for &from in &nodes {
            for &to in &nodes {
                let route = router.route(&graph, from, to, &mut rng).unwrap();
                assert!(route.len() >= 1);
                assert_eq!(route.first().unwrap().id, from);
                assert_eq!(route.last().unwrap().id, to);
            }
        }
    }

    #[test]
    fn same_node_is_single_element_route() {
        let (graph, [a, ..]) = line_graph(Controls::NONE);
        let route = deterministic(Heuristic::Zero).route(&graph, a, a, &mut SimRng::new(0)).unwrap();
        assert_eq!(route.len(), 1);
        assert_eq!(route.search_cost_secs, 0.0);
    }

    #[test]
    fn unreachable_is_no_route() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 0.01));
        let z = b.add_node(GeoPoint::new(0.0, 0.02));
        b.add_road(x, y, 100.0, Some(30.0));
        // z only has an edge *into* y.
        b.add_directed_edge(z, y, 100.0, Some(30.0));
        let graph = b.build();

        let result = deterministic(Heuristic::DegreeDistance).route(&graph, x, z, &mut SimRng::new(0));
        assert!(matches!(result, Err(SpatialError::NoRoute { .. })));
    }

    #[test]
    fn invalid_id_is_not_found() {
        let (graph, [a, ..]) = line_graph(Controls::NONE);
        let router = deterministic(Heuristic::DegreeDistance);
        let result = router.route(&graph, a, NodeId(77), &mut SimRng::new(0));
        assert!(matches!(result, Err(SpatialError::NodeNotFound(NodeId(77)))));
        let result = router.route(&graph, NodeId::INVALID, a, &mut SimRng::new(0));
        assert!(matches!(result, Err(SpatialError::NodeNotFound(_))));
    }

    #[test]
    fn equal_cost_ties_prefer_lower_node_id() {
        // Diamond 0 → {1, 2} → 3, both branches 20 s.
        let mut b = RoadGraphBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.001, 0.001));
        let n2 = b.add_node(GeoPoint::new(-0.001, 0.001));
        let n3 = b.add_node(GeoPoint::new(0.0, 0.002));
        b.add_road(n0, n2, 100.0, Some(36.0));
        b.add_road(n0, n1, 100.0, Some(36.0));
        b.add_road(n2, n3, 100.0, Some(36.0));
        b.add_road(n1, n3, 100.0, Some(36.0));
        let graph = b.build();

        let router = deterministic(Heuristic::Zero);
        for seed in 0..5 {
            let route = router.route(&graph, n0, n3, &mut SimRng::new(seed)).unwrap();
            assert_eq!(route.node_ids().collect::<Vec<_>>(), vec![n0, n1, n3]);
        }
    }

    #[test]
    fn stop_sign_penalty_is_unconditional() {
        let (graph, [a, _, c]) = line_graph(Controls::STOP);
        let router = AStarRouter::from_config(&EngineConfig::default());
        for seed in 0..10 {
            let route = router.route(&graph, a, c, &mut SimRng::new(seed)).unwrap();
            assert!((route.search_cost_secs - 201.0).abs() < 1e-9);
        }
    }

    #[test]
    fn light_penalty_is_sampled() {
        let (graph, [a, _, c]) = line_graph(Controls::LIGHT);
        let router = AStarRouter::from_config(&EngineConfig::default());
        let mut rng = SimRng::new(42);
        let mut saw_red = false;
        let mut saw_green = false;
        for _ in 0..200 {
            let cost = router.route(&graph, a, c, &mut rng).unwrap().search_cost_secs;
            if (cost - 215.0).abs() < 1e-9 {
                saw_red = true;
            } else if (cost - 200.0).abs() < 1e-9 {
                saw_green = true;
            } else {
                panic!("unexpected cost {cost}");
            }
        }
        assert!(saw_red && saw_green);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let (graph, [n0, _, _, _, n4]) = grid_graph();
        let router = AStarRouter::from_config(&EngineConfig::default());
        let r1 = router.route(&graph, n0, n4, &mut SimRng::new(9)).unwrap();
        let r2 = router.route(&graph, n0, n4, &mut SimRng::new(9)).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn route_by_coordinates_snaps_to_routable_nodes() {
        let (graph, [n0, n1, n2, _, n4]) = grid_graph();
        let route = deterministic(Heuristic::DegreeDistance)
            .route_coords(&graph, GeoPoint::new(-0.1, -0.1), GeoPoint::new(1.1, 2.1), &mut SimRng::new(0))
            .unwrap();
        assert_eq!(route.node_ids().collect::<Vec<_>>(), vec![n0, n1, n2, n4]);
    }

    #[test]
    fn route_by_coordinates_on_empty_graph() {
        let graph = crate::RoadGraph::empty();
        let result = deterministic(Heuristic::DegreeDistance).route_coords(
            &graph,
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            &mut SimRng::new(0),
        );
        assert!(matches!(result, Err(SpatialError::NoRoutableNode(_))));
    }
}

// ── ETA estimator ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod eta {
    use fleet_core::{GeoPoint, SimRng};

    use super::helpers::{grid_graph, line_graph};
    use crate::{AStarRouter, Controls, EtaEstimator, RoadGraphBuilder, Router, SampledTravelTime};

    fn path(graph: &crate::RoadGraph, ids: &[fleet_core::NodeId]) -> Vec<crate::RoadNode> {
        ids.iter().map(|&id| graph.node(id).unwrap()).collect()
    }

    #[test]
    fn empty_and_single_are_zero() {
        let (graph, [a, ..]) = line_graph(Controls::NONE);
        let eta = EtaEstimator::default();
        assert_eq!(eta.estimate_minutes(&graph, &[]), 0.0);
        assert_eq!(eta.estimate_minutes(&graph, &path(&graph, &[a])), 0.0);
    }

    #[test]
    fn line_scenario_is_three_and_a_third_minutes() {
        let (graph, [a, b, c]) = line_graph(Controls::NONE);
        let minutes = EtaEstimator::default().estimate_minutes(&graph, &path(&graph, &[a, b, c]));
        assert!((minutes - 200.0 / 60.0).abs() < 1e-9, "got {minutes}");
    }

    #[test]
    fn expected_delays_added_at_arriving_node() {
        let (graph, [a, b, c]) = line_graph(Controls::LIGHT);
        let minutes = EtaEstimator::default().estimate_minutes(&graph, &path(&graph, &[a, b, c]));
        assert!((minutes - 207.5 / 60.0).abs() < 1e-9);

        let (graph, [a, b, c]) = line_graph(Controls::STOP);
        let minutes = EtaEstimator::default().estimate_minutes(&graph, &path(&graph, &[a, b, c]));
        assert!((minutes - 203.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn monotonic_over_common_prefix() {
        let (graph, [n0, n1, n2, n3, n4]) = grid_graph();
        let eta = EtaEstimator::default();
        let full = path(&graph, &[n0, n1, n2, n4, n3]);
        let mut last = 0.0;
        for k in 0..=full.len() {
            let m = eta.estimate_minutes(&graph, &full[..k]);
            assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn missing_edge_or_speed_contributes_nothing() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 0.01));
        let z = b.add_node_with(2, GeoPoint::new(0.0, 0.02), Controls::LIGHT);
        b.add_directed_edge(x, y, 1_000.0, None);
        b.add_directed_edge(y, z, 1_000.0, Some(0.0));
        let graph = b.build();

        let eta = EtaEstimator::default();
        assert_eq!(eta.estimate_minutes(&graph, &path(&graph, &[x, y, z])), 0.0);
        // No x→z edge at all.
        assert_eq!(eta.estimate_minutes(&graph, &path(&graph, &[x, z])), 0.0);
    }

    #[test]
    fn declared_length_not_straight_line() {
        // A and B are a degree of longitude apart (~111 km) but the road is
        // declared as 1000 m: the declared length decides.
        let (graph, [a, b, _]) = line_graph(Controls::NONE);
        let nodes = path(&graph, &[a, b]);
        let straight_secs = nodes[0].pos.distance_m(nodes[1].pos) / 10.0;
        let minutes = EtaEstimator::default().estimate_minutes(&graph, &nodes);
        assert!((minutes - 100.0 / 60.0).abs() < 1e-9);
        assert!(straight_secs / 60.0 > 100.0 * minutes);
    }

    #[test]
    fn unknown_length_falls_back_to_haversine() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 0.01));
        b.add_directed_edge(x, y, 0.0, Some(36.0));
        let graph = b.build();

        let nodes = path(&graph, &[x, y]);
        let expected = nodes[0].pos.distance_m(nodes[1].pos) / 10.0 / 60.0;
        let minutes = EtaEstimator::default().estimate_minutes(&graph, &nodes);
        assert!((minutes - expected).abs() < 1e-9);
    }

    #[test]
    fn deterministic_for_router_output() {
        let (graph, [n0, _, _, _, n4]) = grid_graph();
        let router = AStarRouter::new(SampledTravelTime::deterministic(40.0), Default::default());
        let route = router.route(&graph, n0, n4, &mut SimRng::new(1)).unwrap();
        let eta = EtaEstimator::default();
        let first = eta.estimate_minutes(&graph, &route.nodes);
        assert_eq!(first, eta.estimate_minutes(&graph, &route.nodes));
        assert!((first - 0.5).abs() < 1e-9);
    }
}
