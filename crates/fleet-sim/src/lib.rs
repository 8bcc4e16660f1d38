//! `fleet-sim`: the simulation stepper and the engine facade.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`stepper`]  | `Stepper` (one pass over the fleet), `FleetEvent`, `StepReport` |
//! | [`engine`]   | `FleetEngine` (locks + every public operation), `EngineBuilder` |
//! | [`driver`]   | `Driver` / `DriverHandle`: real-time tick thread                |
//! | [`observer`] | `SimObserver` hooks, `NoopObserver`                             |
//! | [`error`]    | `SimError`, `SimResult<T>`                                      |
//!
//! # Tick
//!
//! ```text
//! tick_at(now):
//!   ① clock    : advance to `now` (never backwards)
//!   ② step     : with the fleet lock held, every vehicle due at `now`
//!                moves one route node or handles route completion
//!   ③ heatmap  : record each drop-off leg planned this tick
//!   ④ observers: events, periodic fleet snapshot, tick end
//! ```
//!
//! The stepper is a plain function of `(vehicles, now, rng)`, so tests drive
//! it with hand-picked instants and a seeded RNG; the [`Driver`] only adds
//! a wall-clock loop around [`FleetEngine::tick_observed`].
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use fleet_core::EngineConfig;
//! use fleet_dispatch::DEFAULT_VEHICLE_NAMES;
//! use fleet_sim::{Driver, FleetEngine, NoopObserver};
//!
//! let engine = Arc::new(FleetEngine::new(graph, EngineConfig::default())?);
//! engine.initialize_fleet(&DEFAULT_VEHICLE_NAMES, 12)?;
//! let driver = Driver::spawn(Arc::clone(&engine), NoopObserver);
//! engine.intake();
//! engine.dispatch_next()?;
//! driver.stop()?;
//! ```

pub mod driver;
pub mod engine;
pub mod error;
pub mod observer;
pub mod stepper;


pub use driver::{Driver, DriverHandle};
pub use engine::{Dispatch, EngineBuilder, FleetEngine};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use stepper::{FleetEvent, StepReport, Stepper};
