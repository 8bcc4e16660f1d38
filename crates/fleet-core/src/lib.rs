//! `fleet-core`: foundational types for the fleet simulation engine.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It has no
//! `fleet-*` dependencies and only a handful of external ones (`rand`,
//! `thiserror`, `serde`, `serde_json`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`, `VehicleId`, `RequesterId`            |
//! | [`geo`]     | `GeoPoint`, haversine and degree-space metrics, `CellKey` |
//! | [`time`]    | `SimTime`, `SimClock`                                     |
//! | [`rng`]     | `SimRng`                                                  |
//! | [`config`]  | `EngineConfig` and the three delay models                 |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EngineConfig, EtaDelayModel, Heuristic, SearchDelayModel, StepDelayModel};
pub use error::{CoreError, CoreResult};
pub use geo::{CellKey, GeoPoint};
pub use ids::{EdgeId, NodeId, RequesterId, VehicleId};
pub use rng::SimRng;
pub use time::{SimClock, SimTime};
