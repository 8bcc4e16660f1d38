//! `fleet-output`: simulation output writers for the fleet engine.
//!
//! | Writer        | Files created                                                |
//! |---------------|--------------------------------------------------------------|
//! | [`CsvWriter`] | `vehicle_snapshots.csv`, `tick_summaries.csv`, `heatmap.csv` |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`SnapshotObserver`], which implements `fleet_sim::SimObserver`.  The
//! heatmap is not streamed; write it once with
//! [`SnapshotObserver::write_heatmap`] when the run is over.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fleet_output::{CsvWriter, SnapshotObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let handle = Driver::spawn(Arc::clone(&engine), SnapshotObserver::new(writer));
//! // ...
//! let mut obs = handle.stop()?;
//! obs.write_heatmap(&engine.heatmap_snapshot());
//! if let Some(e) = obs.take_error() { eprintln!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SnapshotObserver;
pub use row::{HeatmapRow, TickSummaryRow, VehicleSnapshotRow};
pub use writer::OutputWriter;
