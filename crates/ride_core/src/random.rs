use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable randomness behind every simulated guess: GPS jitter, search delays,
/// driver assignment and OTPs.
#[derive(Resource)]
pub struct SimRng {
    rng: StdRng,
}

impl SimRng {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Uniform noise in `[-max_abs, max_abs]`.
    pub fn jitter(&mut self, max_abs: f64) -> f64 {
        if max_abs <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-max_abs..=max_abs)
    }

    /// Uniform delay in `[min_ms, max_ms]`.
    pub fn delay_ms(&mut self, min_ms: u64, max_ms: u64) -> u64 {
        if max_ms <= min_ms {
            return min_ms;
        }
        self.rng.gen_range(min_ms..=max_ms)
    }

    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    /// Four-digit one-time code.
    pub fn otp(&mut self) -> u16 {
        self.rng.gen_range(1000..=9999)
    }
}

impl std::fmt::Debug for SimRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRng").finish_non_exhaustive()
    }
}
