//! Plain data row types written by output backends.

use fleet_core::SimTime;
use fleet_dispatch::{HeatmapCell, Vehicle, VehiclePhase};

/// One vehicle's state at a snapshot tick.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshotRow {
    pub tick:         u64,
    pub time_ms:      u64,
    pub vehicle_id:   u32,
    pub name:         String,
    pub lat:          f64,
    pub lon:          f64,
    pub phase:        &'static str,
    /// `None` while roaming.
    pub requester_id: Option<u32>,
    pub route_index:  usize,
    pub route_len:    usize,
    pub fuel:         f64,
    pub speed_kph:    f64,
    pub eta_minutes:  f64,
}

impl VehicleSnapshotRow {
    pub fn from_vehicle(tick: u64, now: SimTime, v: &Vehicle) -> Self {
        Self {
            tick,
            time_ms:      now.as_millis(),
            vehicle_id:   v.id.0,
            name:         v.name.clone(),
            lat:          v.pos.lat,
            lon:          v.pos.lon,
            phase:        phase_label(v.phase()),
            requester_id: v.requester.as_ref().map(|r| r.id.0),
            route_index:  v.route_index,
            route_len:    v.route.len(),
            fuel:         v.fuel,
            speed_kph:    v.speed_kph,
            eta_minutes:  v.eta_minutes,
        }
    }
}

fn phase_label(phase: VehiclePhase) -> &'static str {
    match phase {
        VehiclePhase::Roaming   => "roaming",
        VehiclePhase::ToPickup  => "to_pickup",
        VehiclePhase::ToDropoff => "to_dropoff",
    }
}

/// Summary of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummaryRow {
    pub tick:      u64,
    pub time_ms:   u64,
    pub moved:     u64,
    pub waiting:   u64,
    pub pickups:   u64,
    pub dropoffs:  u64,
    pub stranded:  u64,
}

/// One heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapRow {
    pub lat:   f64,
    pub lon:   f64,
    pub count: u64,
}

impl From<&HeatmapCell> for HeatmapRow {
    fn from(cell: &HeatmapCell) -> Self {
        Self { lat: cell.lat, lon: cell.lon, count: cell.count }
    }
}
