//! Priors over edge lengths.

use crate::model::Tree;
use std::fmt;

/// A prior density over the edge lengths of a tree, up to a constant.
pub trait Prior: fmt::Debug {
    /// Returns the log prior density of the edge lengths of `tree`.
    fn ln_prior(&self, tree: &Tree) -> f64;
}

/// The improper flat prior; contributes nothing to the posterior.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPrior;

impl Prior for FlatPrior {
    fn ln_prior(&self, _tree: &Tree) -> f64 {
        0.0
    }
}

/// Independent exponential priors with a common mean on all edge lengths.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialEdgePrior {
    mean: f64,
}

impl ExponentialEdgePrior {
    /// # Panics
    /// Panics if `mean` is not positive and finite.
    pub fn new(mean: f64) -> Self {
        assert!(mean > 0.0 && mean.is_finite(), "Mean edge length must be positive, got {mean}");
        ExponentialEdgePrior { mean }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Log density of a single edge of length `length`.
    pub fn ln_density(&self, length: f64) -> f64 {
        -self.mean.ln() - length / self.mean
    }
}

impl Default for ExponentialEdgePrior {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Prior for ExponentialEdgePrior {
    fn ln_prior(&self, tree: &Tree) -> f64 {
        tree.preorder_iter()
            .filter_map(|node| tree.edge_length(node))
            .map(|length| self.ln_density(length))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponential_sums_over_edges() {
        let tree = Tree::from_newick("((Kea:0.1,Kaka:0.2):0.3,Tui:0.4);").unwrap();
        let prior = ExponentialEdgePrior::new(0.5);
        let expected = 4.0 * -(0.5_f64.ln()) - (0.1 + 0.2 + 0.3 + 0.4) / 0.5;
        assert_relative_eq!(prior.ln_prior(&tree), expected, max_relative = 1e-12);
        assert_eq!(FlatPrior.ln_prior(&tree), 0.0);
    }
}
