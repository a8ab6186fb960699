use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Monotonic counter shared by mission and tick identifiers.
#[derive(Debug, Default)]
pub struct IdSequence(AtomicU64);

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier. The first call returns 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Derive a mission's RNG from the registry seed and the mission id.
pub fn mission_rng(base_seed: u64, mission_id: u64) -> (u64, ChaCha8Rng) {
    let seed = base_seed ^ mission_id.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    (seed, ChaCha8Rng::seed_from_u64(seed))
}
