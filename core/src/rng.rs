//! Deterministic random number generation.
//!
//! RULE: Nothing in the desk may call any platform RNG.
//! All randomness flows through IntakeRng instances derived from the
//! single session seed, and only the intake generator draws from one.
//! The assessment path takes no randomness at all.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG stream for seeded case intake.
pub struct IntakeRng {
    inner: Pcg64Mcg,
}

impl IntakeRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Pick one element from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "pick on empty slice");
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}
