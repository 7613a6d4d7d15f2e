//! Random source
//!
//! Every random draw in a spin goes through a [`RandomSource`] handle that the
//! engine receives at construction. The handle is internally synchronized so
//! callers never lock around it.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Uniform random source shared by the generator, the cascade and the controller
pub trait RandomSource: Send + Sync {
    /// Next fraction in [0, 1)
    fn next_f64(&self) -> f64;

    /// Next integer in [min, max). Returns `min` when the range is empty.
    fn next_range(&self, min: u64, max: u64) -> u64;

    /// Uniform value in [-amplitude, amplitude)
    fn jitter(&self, amplitude: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * amplitude
    }
}

/// ChaCha20 stream cipher RNG behind a mutex
pub struct ChaChaSource {
    rng: Mutex<ChaCha20Rng>,
}

impl ChaChaSource {
    /// Seed from the thread-local OS-seeded generator
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::from_rng(&mut rand::rng())),
        }
    }

    /// Deterministic source for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }

    /// Re-seed in place
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock() = ChaCha20Rng::seed_from_u64(seed);
    }
}

impl Default for ChaChaSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for ChaChaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaChaSource").finish_non_exhaustive()
    }
}

impl RandomSource for ChaChaSource {
    fn next_f64(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }

    fn next_range(&self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.rng.lock().random_range(min..max)
    }
}
