//! Expected-value travel time for a planned route.
//!
//! Unlike the search cost in [`router`](crate::router), the ETA never
//! samples: each intersection contributes its probability-weighted delay,
//! so the same route over the same graph always yields the same estimate.

use fleet_core::{EngineConfig, EtaDelayModel};

use crate::graph::{RoadGraph, RoadNode};

/// Converts a route into expected minutes of travel.
#[derive(Clone, Debug, Default)]
pub struct EtaEstimator {
    pub delay: EtaDelayModel,
}

impl EtaEstimator {
    pub fn new(delay: EtaDelayModel) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.eta_delay.clone())
    }

    /// Expected minutes to drive `route` start to finish.
    ///
    /// Each consecutive pair contributes the edge's declared length at the
    /// edge's posted speed plus the expected delay at the arriving node.
    /// The straight-line (haversine) distance between the two nodes is used
    /// only when the declared length is not positive.  On real road data the
    /// declared length follows the road and is longer than the straight
    /// line, so this estimate runs higher than one built on haversine
    /// distance alone.  A pair
    /// with no connecting edge, or whose edge has no positive speed,
    /// contributes nothing.  Routes of zero or one node take zero minutes.
    pub fn estimate_minutes(&self, graph: &RoadGraph, route: &[RoadNode]) -> f64 {
        let mut total_secs = 0.0;
        for pair in route.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let Some(edge) = graph.find_edge(from.id, to.id) else {
                continue;
            };
            let speed_kph = match graph.edge_speed_kph(edge) {
                Some(s) if s > 0.0 => s,
                _ => continue,
            };
            let length_m = graph.edge_length_m(edge);
            let distance_m = if length_m > 0.0 { length_m } else { from.pos.distance_m(to.pos) };

            total_secs += distance_m / (speed_kph / 3.6);
            total_secs += self.delay.expected_delay_secs(to.traffic_light, to.stop_sign);
        }
        total_secs / 60.0
    }
}
