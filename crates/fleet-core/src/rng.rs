//! Simulation RNG wrapper.
//!
//! # Determinism strategy
//!
//! Every stochastic draw in the engine (search-time delay sampling, stepper
//! speed jitter and stop delays, random destinations, intake) is taken from
//! a `SimRng` that the caller passes in explicitly.  Seeding it with a fixed
//! value makes a whole run reproducible; production seeds from OS entropy.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Engine-level RNG.
///
/// The engine keeps its one instance behind a mutex and lends it to each
/// operation.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from operating-system entropy (non-reproducible).
    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// `new(seed)` when a seed is configured, otherwise `from_entropy()`.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::new(s),
            None    => Self::from_entropy(),
        }
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform sample in `[lo, hi]`.  Returns `lo` when the range is empty
    /// or degenerate, so a zero-width jitter range is a valid configuration.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.0.gen_range(lo..=hi)
        } else {
            lo
        }
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
