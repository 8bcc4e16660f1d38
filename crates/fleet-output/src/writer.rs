//! The `OutputWriter` trait implemented by backend writers.

use crate::{HeatmapRow, OutputResult, TickSummaryRow, VehicleSnapshotRow};

/// Sink for simulation output rows.
///
/// Errors are returned to the caller; [`SnapshotObserver`](crate::SnapshotObserver)
/// stores them because observer hooks cannot fail.
pub trait OutputWriter {
    /// Write a batch of vehicle snapshots.
    fn write_snapshots(&mut self, rows: &[VehicleSnapshotRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Replace the heatmap output with `rows`.
    fn write_heatmap(&mut self, rows: &[HeatmapRow]) -> OutputResult<()>;

    /// Flush all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
