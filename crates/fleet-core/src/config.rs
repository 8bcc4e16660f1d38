//! Engine configuration.
//!
//! Typically loaded from a JSON file by the application crate and handed to
//! `FleetEngine::new`.  Every field has a default, so an empty JSON object
//! (`{}`) is a valid configuration that reproduces the reference behaviour.
//!
//! # The three delay models
//!
//! Intersections slow vehicles down in three places, each with its own
//! semantics.  They are separate types so that one cannot be passed where
//! another is expected:
//!
//! | Model                | Where                    | Semantics                   |
//! |----------------------|--------------------------|-----------------------------|
//! | [`SearchDelayModel`] | A* edge cost             | sampled once per expansion  |
//! | [`EtaDelayModel`]    | ETA estimate             | probability-weighted mean   |
//! | [`StepDelayModel`]   | Stepper move scheduling  | sampled once per node       |
//!
//! In every model a traffic light takes precedence over a stop sign.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ── Delay models ──────────────────────────────────────────────────────────────

/// Stochastic penalty added to an edge's travel time during path search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDelayModel {
    /// Seconds added when the light is caught red.
    pub light_penalty_secs: f64,
    /// Chance of catching a light red.
    pub light_probability: f64,
    /// Seconds added unconditionally at a stop sign.
    pub stop_penalty_secs: f64,
}

impl Default for SearchDelayModel {
    fn default() -> Self {
        Self {
            light_penalty_secs: 15.0,
            light_probability:  0.33,
            stop_penalty_secs:  1.0,
        }
    }
}

impl SearchDelayModel {
    /// A model that never adds a delay.  Makes search costs deterministic.
    pub fn none() -> Self {
        Self {
            light_penalty_secs: 0.0,
            light_probability:  0.0,
            stop_penalty_secs:  0.0,
        }
    }
}

/// Expected (probability-weighted) intersection delay used by the ETA
/// estimator.  Deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtaDelayModel {
    pub light_delay_secs: f64,
    pub light_weight:     f64,
    pub stop_delay_secs:  f64,
    pub stop_weight:      f64,
}

impl Default for EtaDelayModel {
    fn default() -> Self {
        Self {
            light_delay_secs: 25.0,
            light_weight:     0.3,
            stop_delay_secs:  5.0,
            stop_weight:      0.6,
        }
    }
}

impl EtaDelayModel {
    /// Expected seconds lost at a node with the given control devices.
    #[inline]
    pub fn expected_delay_secs(&self, traffic_light: bool, stop_sign: bool) -> f64 {
        if traffic_light {
            self.light_delay_secs * self.light_weight
        } else if stop_sign {
            self.stop_delay_secs * self.stop_weight
        } else {
            0.0
        }
    }
}

/// Pause sampled by the stepper after a vehicle reaches a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepDelayModel {
    pub light_delay_secs:  f64,
    pub light_probability: f64,
    pub stop_delay_secs:   f64,
    pub stop_probability:  f64,
}

impl Default for StepDelayModel {
    fn default() -> Self {
        Self {
            light_delay_secs:  25.0,
            light_probability: 0.3,
            stop_delay_secs:   5.0,
            stop_probability:  0.7,
        }
    }
}

// ── Heuristic ─────────────────────────────────────────────────────────────────

/// A* heuristic selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Heuristic {
    /// Euclidean distance in degree space.  Not in the same units as the
    /// time-based edge cost, so it is not a proven lower bound: routes are
    /// heuristic-guided but not guaranteed optimal.
    #[default]
    DegreeDistance,
    /// Great-circle distance divided by the fastest speed on the graph
    /// (or `max_speed_kph`, whichever is higher), in seconds.  Admissible
    /// for the time-cost objective.
    TravelTime { max_speed_kph: f64 },
    /// Uninformed search (Dijkstra order).
    Zero,
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Real-time driver cadence in milliseconds.
    pub tick_interval_ms: u64,

    /// Fleet snapshots are handed to observers every this many ticks
    /// (0 disables them).
    pub snapshot_interval_ticks: u64,

    /// Speed used wherever an edge speed is absent or non-positive.
    pub fallback_speed_kph: f64,

    /// Speed assigned to vehicles at fleet initialization.
    pub initial_speed_kph: f64,

    /// Full-tank resource level.
    pub fuel_capacity: f64,

    /// Resource burned per metre travelled.
    pub fuel_per_meter: f64,

    /// Lower bound of the per-edge speed multiplier.
    pub speed_jitter_min: f64,

    /// Upper bound of the per-edge speed multiplier.
    pub speed_jitter_max: f64,

    /// Extra attempts with fresh random endpoints after a failed search
    /// (idle replanning and intake).
    pub route_retries: u32,

    /// Seconds before a vehicle with no reachable destination tries again.
    pub idle_retry_secs: f64,

    /// Seconds a vehicle waits at the end of a route before moving on.
    pub settle_secs: f64,

    /// Decimal places kept when bucketing positions into heatmap cells.
    pub heatmap_decimals: u8,

    pub search_delay: SearchDelayModel,
    pub eta_delay:    EtaDelayModel,
    pub step_delay:   StepDelayModel,
    pub heuristic:    Heuristic,

    /// Display names handed out to new requesters.
    pub requester_names: Vec<String>,

    /// Master RNG seed.  `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms:        200,
            snapshot_interval_ticks: 5,
            fallback_speed_kph:      40.0,
            initial_speed_kph:       30.0,
            fuel_capacity:           40.0,
            fuel_per_meter:          0.001,
            speed_jitter_min:        0.9,
            speed_jitter_max:        1.1,
            route_retries:           5,
            idle_retry_secs:         2.0,
            settle_secs:             2.0,
            heatmap_decimals:        5,
            search_delay:            SearchDelayModel::default(),
            eta_delay:               EtaDelayModel::default(),
            step_delay:              StepDelayModel::default(),
            heuristic:               Heuristic::default(),
            requester_names:         ["Ryan", "Luke", "Nancy", "Bob", "Jess"]
                .into_iter()
                .map(String::from)
                .collect(),
            seed:                    None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Real-time driver cadence as a `Duration`.
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(CoreError::Config("tick_interval_ms must be positive".into()));
        }
        if !(self.fallback_speed_kph > 0.0) {
            return Err(CoreError::Config("fallback_speed_kph must be positive".into()));
        }
        if !(self.fuel_capacity > 0.0) {
            return Err(CoreError::Config("fuel_capacity must be positive".into()));
        }
        if self.fuel_per_meter < 0.0 {
            return Err(CoreError::Config("fuel_per_meter must not be negative".into()));
        }
        if self.speed_jitter_min > self.speed_jitter_max {
            return Err(CoreError::Config(format!(
                "speed jitter range [{}, {}] is inverted",
                self.speed_jitter_min, self.speed_jitter_max
            )));
        }
        let probabilities = [
            ("search_delay.light_probability", self.search_delay.light_probability),
            ("step_delay.light_probability",   self.step_delay.light_probability),
            ("step_delay.stop_probability",    self.step_delay.stop_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(CoreError::Config(format!("{name} = {p} is not in [0, 1]")));
            }
        }
        if let Heuristic::TravelTime { max_speed_kph } = self.heuristic {
            if !(max_speed_kph > 0.0) {
                return Err(CoreError::Config("heuristic max_speed_kph must be positive".into()));
            }
        }
        Ok(())
    }
}
