//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `vehicle_snapshots.csv`
//! - `tick_summaries.csv`
//! - `heatmap.csv` (rewritten whole on every [`write_heatmap`](OutputWriter::write_heatmap))

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::{HeatmapRow, OutputResult, TickSummaryRow, VehicleSnapshotRow};
use crate::writer::OutputWriter;

const SNAPSHOT_HEADER: [&str; 13] = [
    "tick", "time_ms", "vehicle_id", "name", "lat", "lon", "phase", "requester_id",
    "route_index", "route_len", "fuel", "speed_kph", "eta_minutes",
];
const SUMMARY_HEADER: [&str; 7] = ["tick", "time_ms", "moved", "waiting", "pickups", "dropoffs", "stranded"];
const HEATMAP_HEADER: [&str; 3] = ["lat", "lon", "count"];

/// Writes simulation output to CSV files.
pub struct CsvWriter {
    dir:        PathBuf,
    snapshots:  Writer<File>,
    summaries:  Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the snapshot and summary files, and
    /// write their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut snapshots = Writer::from_path(dir.join("vehicle_snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADER)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            snapshots,
            summaries,
            finished: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[VehicleSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.tick.to_string(),
                row.time_ms.to_string(),
                row.vehicle_id.to_string(),
                row.name.clone(),
                row.lat.to_string(),
                row.lon.to_string(),
                row.phase.to_owned(),
                row.requester_id.map(|id| id.to_string()).unwrap_or_default(),
                row.route_index.to_string(),
                row.route_len.to_string(),
                format!("{:.3}", row.fuel),
                format!("{:.2}", row.speed_kph),
                format!("{:.2}", row.eta_minutes),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.time_ms.to_string(),
            row.moved.to_string(),
            row.waiting.to_string(),
            row.pickups.to_string(),
            row.dropoffs.to_string(),
            row.stranded.to_string(),
        ])?;
        Ok(())
    }

    fn write_heatmap(&mut self, rows: &[HeatmapRow]) -> OutputResult<()> {
        let mut heatmap = Writer::from_path(self.dir.join("heatmap.csv"))?;
        heatmap.write_record(HEATMAP_HEADER)?;
        for row in rows {
            heatmap.write_record(&[row.lat.to_string(), row.lon.to_string(), row.count.to_string()])?;
        }
        heatmap.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
