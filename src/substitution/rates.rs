//! Rate categories and per-category transition matrices.

/// Discrete among-site rate heterogeneity: relative rates and their
/// probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCategories {
    rates: Vec<f64>,
    probabilities: Vec<f64>,
}

impl RateCategories {
    /// A single category with rate one.
    pub fn single() -> Self {
        RateCategories { rates: vec![1.0], probabilities: vec![1.0] }
    }

    /// Creates rate categories.
    ///
    /// # Panics
    /// Panics if the vectors are empty or of different length, any rate is
    /// negative, or the probabilities are negative or do not sum to one.
    pub fn new(rates: Vec<f64>, probabilities: Vec<f64>) -> Self {
        assert!(!rates.is_empty(), "Need at least one rate category");
        assert_eq!(rates.len(), probabilities.len(), "One probability per rate category");
        assert!(rates.iter().all(|&r| r >= 0.0 && r.is_finite()), "Rates must be non-negative");
        assert!(probabilities.iter().all(|&p| p >= 0.0), "Probabilities must be non-negative");
        let total: f64 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-10, "Probabilities must sum to one, got {total}");
        RateCategories { rates, probabilities }
    }

    /// Creates `n` equally probable categories with the given rates.
    pub fn equal(rates: Vec<f64>) -> Self {
        let n = rates.len();
        RateCategories::new(rates, vec![1.0 / n as f64; n])
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl Default for RateCategories {
    fn default() -> Self {
        Self::single()
    }
}

/// One row-major transition matrix per rate category, stored contiguously.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionMatrices {
    num_rates: usize,
    num_states: usize,
    values: Vec<f64>,
}

impl TransitionMatrices {
    /// Creates zeroed matrices.
    pub fn new(num_rates: usize, num_states: usize) -> Self {
        TransitionMatrices { num_rates, num_states, values: vec![0.0; num_rates * num_states * num_states] }
    }

    /// Changes the dimensions, keeping the allocation where possible.
    pub fn resize(&mut self, num_rates: usize, num_states: usize) {
        self.num_rates = num_rates;
        self.num_states = num_states;
        self.values.resize(num_rates * num_states * num_states, 0.0);
    }

    pub fn num_rates(&self) -> usize {
        self.num_rates
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Returns the matrix of rate category `rate` as a row-major slice.
    pub fn matrix(&self, rate: usize) -> &[f64] {
        let size = self.num_states * self.num_states;
        &self.values[rate * size..(rate + 1) * size]
    }

    /// Returns the matrix of rate category `rate` as a mutable row-major slice.
    pub fn matrix_mut(&mut self, rate: usize) -> &mut [f64] {
        let size = self.num_states * self.num_states;
        &mut self.values[rate * size..(rate + 1) * size]
    }

    /// Returns `P[rate][from][to]`.
    pub fn get(&self, rate: usize, from: usize, to: usize) -> f64 {
        self.values[(rate * self.num_states + from) * self.num_states + to]
    }
}
