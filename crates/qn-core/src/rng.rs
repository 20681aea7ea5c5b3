//! Deterministic simulation-level RNG.
//!
//! Routing selectors that make random choices draw from a `SimRng` seeded
//! from `SimConfig::seed`.  Children derived with [`SimRng::child`] get
//! independent streams, so adding a second random selector does not disturb
//! the choices of the first.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG.  Used only from the single simulation thread.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// A uniform sample from `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Pick an index according to `weights` (need not sum to one).
    ///
    /// Returns `None` when a draw falls into the residual mass `1 - sum`
    /// (for sub-stochastic weights) or when `weights` is empty.
    pub fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let u = self.unit();
        let mut acc = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            acc += w;
            if u < acc {
                return Some(i);
            }
        }
        None
    }
}
