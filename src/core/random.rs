//! Randomness source shared by every selection during an expansion.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A function producing values in `[0, 1)`, called exactly once per
/// selection so a fixed source replays the same expansion.
pub struct RandomSource {
    draw: Box<dyn FnMut() -> f64 + Send>,
}

impl RandomSource {
    /// Wrap an arbitrary generator. Values outside `[0, 1)` are clamped.
    pub fn from_fn<F>(draw: F) -> Self
    where
        F: FnMut() -> f64 + Send + 'static,
    {
        Self {
            draw: Box::new(draw),
        }
    }

    /// A seeded `StdRng`, reproducible across runs.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::from_fn(move || rng.gen::<f64>())
    }

    pub fn from_entropy() -> Self {
        let mut rng = StdRng::from_entropy();
        Self::from_fn(move || rng.gen::<f64>())
    }

    /// Always returns `value`.
    pub fn fixed(value: f64) -> Self {
        Self::from_fn(move || value)
    }

    /// Replays `values` in order, cycling when exhausted.
    pub fn sequence(values: Vec<f64>) -> Self {
        let mut index = 0;
        Self::from_fn(move || {
            if values.is_empty() {
                return 0.0;
            }
            let value = values[index % values.len()];
            index += 1;
            value
        })
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let value = (self.draw)();
        if value.is_nan() || value < 0.0 {
            0.0
        } else if value >= 1.0 {
            1.0 - f64::EPSILON
        } else {
            value
        }
    }

    /// Uniform index into a sequence of `len` items. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64).floor() as usize;
        index.min(len.saturating_sub(1))
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}
