//! Visit counts over rounded coordinates.
//!
//! Positions are bucketed by rounding latitude and longitude to a fixed
//! number of decimal places (5 by default, about one metre), which folds
//! near-duplicate node positions into one cell.  Cells appear on first
//! visit and their counts only ever grow.

use rustc_hash::FxHashMap;
use serde::Serialize;

use fleet_core::{CellKey, GeoPoint};
use fleet_spatial::RoadNode;

/// One heatmap cell as handed out by [`Heatmap::snapshot`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub lat:   f64,
    pub lon:   f64,
    pub count: u64,
}

#[derive(Debug)]
pub struct Heatmap {
    decimals: u8,
    counts:   FxHashMap<CellKey, u64>,
    total:    u64,
}

impl Heatmap {
    pub fn new(decimals: u8) -> Self {
        Self { decimals, counts: FxHashMap::default(), total: 0 }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Number of distinct cells visited.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of every cell's count.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn record(&mut self, pos: GeoPoint) {
        *self.counts.entry(pos.cell(self.decimals)).or_insert(0) += 1;
        self.total += 1;
    }

    /// One increment per node of a newly planned leg.
    pub fn record_route(&mut self, nodes: &[RoadNode]) {
        for node in nodes {
            self.record(node.pos);
        }
    }

    pub fn count_at(&self, pos: GeoPoint) -> u64 {
        self.counts.get(&pos.cell(self.decimals)).copied().unwrap_or(0)
    }

    /// Every cell, ordered by latitude then longitude.
    pub fn snapshot(&self) -> Vec<HeatmapCell> {
        let mut keys: Vec<(&CellKey, &u64)> = self.counts.iter().collect();
        keys.sort_unstable_by_key(|(k, _)| **k);
        keys.into_iter()
            .map(|(k, &count)| {
                let center = k.center(self.decimals);
                HeatmapCell { lat: center.lat, lon: center.lon, count }
            })
            .collect()
    }
}

impl Default for Heatmap {
    fn default() -> Self {
        Self::new(5)
    }
}
