//! Random source used by the daily sampling roll.

use rand::Rng;

/// Uniform random draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    /// Draw the next value in `[0, 1)`.
    fn next_unit(&self) -> f64;
}

/// Thread-local RNG from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Always returns the same value. Handy for rigging a roll.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl FixedRandom {
    /// A source whose roll always selects (any positive probability).
    pub const fn always_selects() -> Self {
        Self(0.0)
    }

    /// A source whose roll never selects below probability `1.0`.
    pub const fn never_selects() -> Self {
        Self(0.999_999)
    }
}

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}
