//! Simulation observer trait for progress reporting and data collection.

use fleet_core::SimTime;
use fleet_dispatch::Vehicle;

use crate::{FleetEvent, StepReport};

/// Callbacks invoked by [`FleetEngine::tick_observed`][crate::FleetEngine::tick_observed]
/// and by the real-time [`Driver`][crate::Driver].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: pickup counter
///
/// ```rust,ignore
/// struct Pickups(usize);
///
/// impl SimObserver for Pickups {
///     fn on_event(&mut self, _now: SimTime, event: &FleetEvent) {
///         if matches!(event, FleetEvent::PickedUp { .. }) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the start of each tick, before any vehicle moves.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// Called once per trip-level event, in vehicle order.
    fn on_event(&mut self, _now: SimTime, _event: &FleetEvent) {}

    /// Called at the end of each tick.
    fn on_tick_end(&mut self, _now: SimTime, _report: &StepReport) {}

    /// Called every `snapshot_interval_ticks` ticks with the whole fleet.
    ///
    /// The fleet lock is held for the duration of the call; keep it short.
    fn on_snapshot(&mut self, _now: SimTime, _vehicles: &[Vehicle]) {}

    /// Called once when the driver stops.
    fn on_run_end(&mut self, _now: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
