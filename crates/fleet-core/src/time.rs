//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing millisecond counter, [`SimTime`],
//! measured from engine start.  The stepper never reads a wall clock: the
//! real-time driver converts `Instant::elapsed()` into a `SimTime` and
//! passes it in, and tests construct `SimTime` values directly.
//!
//! Integer milliseconds keep comparisons exact; delays expressed in
//! fractional seconds are rounded to the nearest millisecond.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Milliseconds since engine start.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> SimTime {
        SimTime(secs * 1_000)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// The time `secs` seconds after `self`.  Negative or non-finite inputs
    /// are treated as zero.
    #[inline]
    pub fn after_secs(self, secs: f64) -> SimTime {
        if !secs.is_finite() || secs <= 0.0 {
            return self;
        }
        SimTime(self.0.saturating_add((secs * 1_000.0).round() as u64))
    }

    /// Milliseconds elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<Duration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0.saturating_add(rhs.as_millis() as u64))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{:.3}s", self.as_secs_f64())
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current simulated time and the number of ticks run.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug, Default)]
pub struct SimClock {
    /// The current time: moved forward by [`advance_to`](Self::advance_to).
    pub now: SimTime,
    /// Number of completed ticks.
    pub ticks: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick at `now`.  Time never moves backwards: an earlier
    /// `now` leaves the clock where it is.
    #[inline]
    pub fn advance_to(&mut self, now: SimTime) {
        self.now = self.now.max(now);
        self.ticks += 1;
    }

    /// Record a tick `interval` after the current time.
    #[inline]
    pub fn advance_by(&mut self, interval: Duration) {
        let next = self.now + interval;
        self.advance_to(next);
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick {} ({})", self.ticks, self.now)
    }
}
