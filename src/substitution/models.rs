//! Reference substitution models.

use crate::substitution::{RateCategories, SubstitutionModel};

/// The Jukes-Cantor model generalized to `n` states: all states equally
/// frequent, all substitutions equally likely.
///
/// # Example
/// ```
/// use phylik::substitution::{JukesCantor, SubstitutionModel};
///
/// let jc = JukesCantor::dna();
/// let mut p = vec![0.0; 16];
/// jc.transition_probabilities(0.0, 1.0, &mut p);
/// assert_eq!(p[0], 1.0);
/// assert_eq!(p[1], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct JukesCantor {
    frequencies: Vec<f64>,
    rates: RateCategories,
}

impl JukesCantor {
    /// Creates the model for `num_states` states and a single rate category.
    ///
    /// # Panics
    /// Panics if `num_states < 2`.
    pub fn new(num_states: usize) -> Self {
        assert!(num_states >= 2, "Jukes-Cantor needs at least two states");
        JukesCantor { frequencies: vec![1.0 / num_states as f64; num_states], rates: RateCategories::single() }
    }

    /// The nucleotide model.
    pub fn dna() -> Self {
        Self::new(4)
    }

    /// Uses the given rate categories.
    pub fn with_rates(mut self, rates: RateCategories) -> Self {
        self.rates = rates;
        self
    }
}

impl SubstitutionModel for JukesCantor {
    fn num_states(&self) -> usize {
        self.frequencies.len()
    }

    fn state_frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    fn rate_categories(&self) -> &RateCategories {
        &self.rates
    }

    fn transition_probabilities(&self, edge_length: f64, rate: f64, out: &mut [f64]) {
        let n = self.frequencies.len();
        let n_f = n as f64;
        // Edge length in expected substitutions per site
        let decay = (-n_f / (n_f - 1.0) * edge_length * rate).exp();
        let same = 1.0 / n_f + (n_f - 1.0) / n_f * decay;
        let different = 1.0 / n_f - decay / n_f;
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = if i == j { same } else { different };
            }
        }
    }
}

/// A model under which no substitution ever happens: `P(t) = I` for all `t`.
///
/// Data is then only possible if every tip shows (or may show) the same
/// state at a site.
#[derive(Debug, Clone)]
pub struct IdentityModel {
    frequencies: Vec<f64>,
    rates: RateCategories,
}

impl IdentityModel {
    /// Creates the model with uniform frequencies over `num_states` states.
    pub fn new(num_states: usize) -> Self {
        IdentityModel { frequencies: vec![1.0 / num_states as f64; num_states], rates: RateCategories::single() }
    }
}

impl SubstitutionModel for IdentityModel {
    fn num_states(&self) -> usize {
        self.frequencies.len()
    }

    fn state_frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    fn rate_categories(&self) -> &RateCategories {
        &self.rates
    }

    fn transition_probabilities(&self, _edge_length: f64, _rate: f64, out: &mut [f64]) {
        let n = self.frequencies.len();
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = if i == j { 1.0 } else { 0.0 };
            }
        }
    }
}
