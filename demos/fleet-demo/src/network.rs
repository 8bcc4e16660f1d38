//! Synthetic road grid used when no graph file is given.
//!
//! A square grid of two-way streets around downtown Mobile, Alabama.
//! Intersections alternate between traffic lights and stop signs, and the
//! outer ring is an unposted road so the fallback speed gets exercised.

use fleet_core::GeoPoint;
use fleet_spatial::{Controls, RoadGraph, RoadGraphBuilder};

const ORIGIN:      GeoPoint = GeoPoint { lat: 30.680, lon: -88.060 };
const SPACING_DEG: f64      = 0.004;
const BLOCK_M:     f64      = 430.0;
const STREET_KPH:  f64      = 40.0;

/// Build a `side` × `side` grid.  Node `r * side + c` gets graph-file id
/// `r * side + c + 1`.
pub fn build_grid(side: usize) -> RoadGraph {
    let mut b = RoadGraphBuilder::with_capacity(side * side, 4 * side * side);
    let mut ids = Vec::with_capacity(side * side);
    for r in 0..side {
        for c in 0..side {
            let pos = GeoPoint::new(ORIGIN.lat + r as f64 * SPACING_DEG, ORIGIN.lon + c as f64 * SPACING_DEG);
            let controls = if (r + c) % 2 == 0 { Controls::LIGHT } else { Controls::STOP };
            ids.push(b.add_node_with((r * side + c + 1) as i64, pos, controls));
        }
    }

    let edge = |r: usize, c: usize| r == 0 || c == 0 || r + 1 == side || c + 1 == side;
    for r in 0..side {
        for c in 0..side {
            let here = ids[r * side + c];
            if c + 1 < side {
                let speed = (!(edge(r, c) && edge(r, c + 1))).then_some(STREET_KPH);
                b.add_road(here, ids[r * side + c + 1], BLOCK_M, speed);
            }
            if r + 1 < side {
                let speed = (!(edge(r, c) && edge(r + 1, c))).then_some(STREET_KPH);
                b.add_road(here, ids[(r + 1) * side + c], BLOCK_M, speed);
            }
        }
    }
    b.build()
}
