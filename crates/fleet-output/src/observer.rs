//! `SnapshotObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use fleet_core::SimTime;
use fleet_dispatch::{HeatmapCell, Vehicle};
use fleet_sim::{FleetEvent, SimObserver, StepReport};

use crate::row::{HeatmapRow, TickSummaryRow, VehicleSnapshotRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes vehicle snapshots and tick summaries to an
/// [`OutputWriter`].
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After the run, check for errors with
/// [`take_error`][Self::take_error].
pub struct SnapshotObserver<W: OutputWriter> {
    writer:     W,
    tick:       u64,
    pending:    TickSummaryRow,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SnapshotObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            tick:       0,
            pending:    TickSummaryRow::default(),
            last_error: None,
        }
    }

    /// Ticks observed so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Write the heatmap snapshot through the underlying writer.
    pub fn write_heatmap(&mut self, cells: &[HeatmapCell]) {
        let rows: Vec<HeatmapRow> = cells.iter().map(HeatmapRow::from).collect();
        let result = self.writer.write_heatmap(&rows);
        self.store_err(result);
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SnapshotObserver<W> {
    fn on_tick_start(&mut self, now: SimTime) {
        self.tick += 1;
        self.pending = TickSummaryRow { tick: self.tick, time_ms: now.as_millis(), ..TickSummaryRow::default() };
    }

    fn on_event(&mut self, _now: SimTime, event: &FleetEvent) {
        match event {
            FleetEvent::PickedUp { .. }   => self.pending.pickups += 1,
            FleetEvent::DroppedOff { .. } => self.pending.dropoffs += 1,
            FleetEvent::Stranded { .. }   => self.pending.stranded += 1,
            FleetEvent::Replanned { .. }  => {}
        }
    }

    fn on_tick_end(&mut self, _now: SimTime, report: &StepReport) {
        self.pending.moved = report.moved as u64;
        self.pending.waiting = report.waiting as u64;
        let result = self.writer.write_tick_summary(&self.pending);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, now: SimTime, vehicles: &[Vehicle]) {
        let rows: Vec<VehicleSnapshotRow> = vehicles
            .iter()
            .map(|v| VehicleSnapshotRow::from_vehicle(self.tick, now, v))
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }
    }

    fn on_run_end(&mut self, _now: SimTime) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
