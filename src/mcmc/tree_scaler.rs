//! Rescaling of the whole tree at once.

use crate::config::{DEFAULT_MIN_EDGE_LENGTH, DEFAULT_TREE_SCALER_LAMBDA};
use crate::mcmc::edge_move::edge_nodes;
use crate::mcmc::move_engine::{ChainState, Move, MoveStatus};
use crate::model::{EdgeLength, NodeId};
use tracing::trace;

/// Multiplies every edge length by a common factor `m = exp(λ(u - 0.5))`.
///
/// The factor is proposed like the multiplier of an [EdgeMove](crate::mcmc::EdgeMove),
/// giving the Hastings ratio `m`. Spreading one factor over `n` edges adds
/// the Jacobian `m^(n-1)`, so the two together contribute `n·ln(m)` to the
/// acceptance ratio. Edges clamped at the floor enter the Jacobian with the
/// ratio actually applied to them.
#[derive(Debug, Clone)]
pub struct TreeScalerMove {
    lambda: f64,
    min_edge_length: f64,
    status: MoveStatus,
    orig_lengths: Vec<(NodeId, f64)>,
    ln_multiplier: f64,
    ln_jacobian: f64,
}

impl TreeScalerMove {
    /// # Panics
    /// Panics if `lambda` is not positive.
    pub fn new(lambda: f64) -> Self {
        assert!(lambda > 0.0, "Tuning parameter must be positive, got {lambda}");
        TreeScalerMove {
            lambda,
            min_edge_length: DEFAULT_MIN_EDGE_LENGTH,
            status: MoveStatus::Idle,
            orig_lengths: Vec::new(),
            ln_multiplier: 0.0,
            ln_jacobian: 0.0,
        }
    }

    pub fn with_min_edge_length(mut self, min_edge_length: f64) -> Self {
        self.min_edge_length = min_edge_length;
        self
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Proposes multiplying every edge length by `multiplier`.
    ///
    /// # Panics
    /// Panics if a proposal is pending.
    pub fn propose_for(&mut self, state: &mut ChainState, multiplier: f64) {
        assert!(!self.status.is_pending(), "Tree scaler already has a pending proposal");
        let (tree, evaluator) = state.tree_and_evaluator();
        evaluator.begin_proposal();

        self.orig_lengths.clear();
        let mut ln_applied = 0.0;
        for node in edge_nodes(tree) {
            let orig = tree.edge_length(node).unwrap_or(self.min_edge_length);
            let length = EdgeLength::clamped(orig * multiplier, self.min_edge_length).value();
            tree.set_edge_length(node, length);
            ln_applied += (length / orig).ln();
            self.orig_lengths.push((node, orig));
        }
        evaluator.invalidate_all_slots(tree);

        self.ln_multiplier = multiplier.ln();
        self.ln_jacobian = ln_applied - self.ln_multiplier;
        trace!(multiplier, num_edges = self.orig_lengths.len(), "tree scaler proposed");
        self.status = MoveStatus::Proposed;
    }

    fn finish(&mut self, outcome: MoveStatus) {
        assert!(self.status.is_pending(), "Tree scaler has no pending proposal");
        self.status = outcome;
    }
}

impl Default for TreeScalerMove {
    fn default() -> Self {
        Self::new(DEFAULT_TREE_SCALER_LAMBDA)
    }
}

impl Move for TreeScalerMove {
    fn name(&self) -> &str {
        "tree-scaler"
    }

    fn status(&self) -> MoveStatus {
        self.status
    }

    fn propose_new_state(&mut self, state: &mut ChainState) {
        let u = state.rng().uniform();
        self.propose_for(state, (self.lambda * (u - 0.5)).exp());
    }

    fn ln_hastings_ratio(&self) -> f64 {
        self.ln_multiplier
    }

    fn ln_jacobian(&self) -> f64 {
        self.ln_jacobian
    }

    fn accept(&mut self, state: &mut ChainState) {
        self.finish(MoveStatus::Accepted);
        state.evaluator_mut().discard_cache();
    }

    fn revert(&mut self, state: &mut ChainState) {
        self.finish(MoveStatus::Reverted);
        let (tree, evaluator) = state.tree_and_evaluator();
        for &(node, length) in &self.orig_lengths {
            tree.set_edge_length(node, length);
        }
        evaluator.restore_from_cache();
    }
}
