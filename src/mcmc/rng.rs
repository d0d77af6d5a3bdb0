//! Source of randomness for moves.

use rand::Rng;

/// Uniform random numbers, as needed by moves and the acceptance step.
///
/// Implemented for every [rand::Rng], so a seeded
/// [StdRng](rand::rngs::StdRng) can be used directly.
pub trait RandomSource {
    /// Returns a uniform draw from `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Returns a uniform draw from `0..n`.
    ///
    /// # Panics
    /// Panics if `n` is zero.
    fn sample_uniform_int(&mut self, n: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn uniform(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }

    fn sample_uniform_int(&mut self, n: usize) -> usize {
        assert!(n > 0, "Cannot sample from an empty range");
        self.gen_range(0..n)
    }
}
