//! `fleet-dispatch`: fleet state and the demand side of the engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`vehicle`]   | `Vehicle`, `VehiclePhase` (derived trip phase)               |
//! | [`requester`] | `Requester`                                                  |
//! | [`fleet`]     | `FleetRegistry`: fixed vehicle roster with name lookup       |
//! | [`queue`]     | `RequestQueue`: FIFO of waiting requesters + id allocation   |
//! | [`matcher`]   | `Matcher` trait, `NearestAvailable`, `Pairing`               |
//! | [`heatmap`]   | `Heatmap`: visit counts over rounded coordinates             |
//! | [`error`]     | `DispatchError`, `DispatchResult<T>`                         |
//!
//! Nothing here locks.  `fleet-sim` owns one lock per structure and decides
//! the acquisition order.
//!
//! # Trip phases
//!
//! A vehicle carries no explicit state tag.  Its phase is derived from
//! whether it has a requester and whether it is on the pickup leg:
//!
//! ```text
//!             assign                 pickup route done
//!   Roaming ─────────► ToPickup ─────────────────────► ToDropoff
//!      ▲                                                   │
//!      └────────────────── drop-off route done ────────────┘
//! ```

pub mod error;
pub mod fleet;
pub mod heatmap;
pub mod matcher;
pub mod queue;
pub mod requester;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use error::{DispatchError, DispatchResult};
pub use fleet::{roster_names, FleetRegistry, DEFAULT_VEHICLE_NAMES};
pub use heatmap::{Heatmap, HeatmapCell};
pub use matcher::{Matcher, NearestAvailable, Pairing};
pub use queue::RequestQueue;
pub use requester::Requester;
pub use vehicle::{Vehicle, VehiclePhase};
