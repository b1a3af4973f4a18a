//! Deterministic random number generation.
//!
//! RULE: Nothing in the crate may call any platform RNG.
//! All randomness flows through a DatasetRng built from an explicit seed,
//! so the same seed always reproduces the same dataset.
//!
//! The underlying generator is a 128-bit multiplicative congruential
//! generator with a permuted output (PCG "MCG" variant).

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct DatasetRng {
    inner: Pcg64Mcg,
}

impl DatasetRng {
    pub fn new(seed: u64) -> Self {
        // Spread small seeds across the state space.
        let derived_seed = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ 0x5851_f42d_4c95_7f2d;
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Pick one of `items` with probability proportional to `weights`.
    /// Falls back to the last item when rounding leaves the roll unspent.
    pub fn pick_weighted<T: Copy>(&mut self, items: &[T], weights: &[f64]) -> T {
        assert!(!items.is_empty() && items.len() == weights.len(), "items/weights mismatch");
        let total: f64 = weights.iter().sum();
        let mut roll = self.next_f64() * total;
        for (item, weight) in items.iter().zip(weights) {
            roll -= weight;
            if roll <= 0.0 {
                return *item;
            }
        }
        items[items.len() - 1]
    }
}
