//! Substitution-model contract used by the likelihood engine.
//!
//! The engine only needs per-rate-category transition probabilities for an
//! edge length and the equilibrium state frequencies; see
//! [SubstitutionModel]. Two reference models are provided:
//! - [JukesCantor]: equal rates and frequencies, closed form
//! - [IdentityModel]: no substitutions at all (`P = I`), mainly for tests

pub mod models;
pub mod rates;

pub use models::{IdentityModel, JukesCantor};
pub use rates::{RateCategories, TransitionMatrices};

use std::fmt;

// =#========================================================================#=
// SUBSTITUTION MODEL
// =#========================================================================#=
/// A continuous-time Markov substitution model.
pub trait SubstitutionModel: fmt::Debug {
    /// Number of primary states.
    fn num_states(&self) -> usize;

    /// Equilibrium state frequencies, summing to one.
    fn state_frequencies(&self) -> &[f64];

    /// Among-site rate categories.
    fn rate_categories(&self) -> &RateCategories;

    /// Writes the row-major `num_states × num_states` matrix of transition
    /// probabilities along an edge of length `edge_length` scaled by the
    /// relative `rate` into `out`.
    fn transition_probabilities(&self, edge_length: f64, rate: f64, out: &mut [f64]);

    /// Fills `out` with one transition matrix per rate category.
    fn compute_transition_probabilities(&self, edge_length: f64, out: &mut TransitionMatrices) {
        let categories = self.rate_categories();
        out.resize(categories.len(), self.num_states());
        for (r, &rate) in categories.rates().iter().enumerate() {
            self.transition_probabilities(edge_length, rate, out.matrix_mut(r));
        }
    }
}
