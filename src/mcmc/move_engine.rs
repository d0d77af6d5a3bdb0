//! The Metropolis-Hastings cycle shared by all moves.
//!
//! A move goes through `Idle -> Proposed -> {Accepted | Reverted} -> Idle`.
//! [Move::update] drives one such cycle against a [ChainState]; moves only
//! implement the proposal, its Hastings correction and how to undo it.

use crate::likelihood::{LikelihoodError, LikelihoodEvaluator};
use crate::mcmc::ChainError;
use crate::mcmc::prior::Prior;
use crate::mcmc::rng::RandomSource;
use crate::model::{EdgeLength, Tree};
use std::fmt;
use tracing::trace;

/// Where a move is in its propose/accept/revert cycle.
///
/// `Accepted` and `Reverted` record the outcome of the last proposal and
/// count as idle: the next proposal may start from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveStatus {
    #[default]
    Idle,
    Proposed,
    Accepted,
    Reverted,
}

impl MoveStatus {
    /// Whether a proposal waits for [Move::accept] or [Move::revert].
    pub fn is_pending(self) -> bool {
        self == MoveStatus::Proposed
    }
}

// =#========================================================================#=
// CHAIN STATE
// =#========================================================================#=
/// Everything a move acts on: the tree, its likelihood evaluator, the
/// prior, the random source and the last accepted posterior terms.
///
/// The tree is always rooted at a tip, so every internal node has a parent
/// and the local moves can always find a path of three edges.
pub struct ChainState {
    tree: Tree,
    evaluator: LikelihoodEvaluator,
    prior: Box<dyn Prior>,
    rng: Box<dyn RandomSource>,
    heating: f64,
    ln_likelihood: f64,
    ln_prior: f64,
}

impl ChainState {
    /// Prepares `tree` for sampling and computes the starting posterior.
    ///
    /// A tree not rooted at a tip is rerooted at its first leaf, and edge
    /// lengths below `min_edge_length` (or missing) are raised to it.
    ///
    /// # Errors
    /// Fails if the tree has no leaf or the likelihood cannot be computed.
    pub fn new(
        mut tree: Tree,
        mut evaluator: LikelihoodEvaluator,
        prior: Box<dyn Prior>,
        rng: Box<dyn RandomSource>,
        heating: f64,
        min_edge_length: f64,
    ) -> Result<Self, ChainError> {
        let root = tree.root().ok_or(ChainError::NoLeaf)?;
        if !tree.is_tip(root) {
            let leaf = tree.first_leaf().ok_or(ChainError::NoLeaf)?;
            tree.reroot_at(leaf)?;
        }
        let nodes: Vec<_> = tree.preorder_iter().filter(|&id| tree.parent(id).is_some()).collect();
        for node in nodes {
            let length = tree.edge_length(node).unwrap_or(0.0);
            tree.set_edge_length(node, EdgeLength::clamped(length, min_edge_length).value());
        }

        evaluator.invalidate_all();
        let mut state = ChainState {
            tree,
            evaluator,
            prior,
            rng,
            heating,
            ln_likelihood: 0.0,
            ln_prior: 0.0,
        };
        state.ln_likelihood = state.compute_ln_likelihood()?;
        state.ln_prior = state.prior.ln_prior(&state.tree);
        Ok(state)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn evaluator(&self) -> &LikelihoodEvaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut LikelihoodEvaluator {
        &mut self.evaluator
    }

    /// Splits the state into tree and evaluator, for moves that edit one
    /// and invalidate the other.
    pub fn tree_and_evaluator(&mut self) -> (&mut Tree, &mut LikelihoodEvaluator) {
        (&mut self.tree, &mut self.evaluator)
    }

    pub fn rng(&mut self) -> &mut dyn RandomSource {
        self.rng.as_mut()
    }

    pub fn heating(&self) -> f64 {
        self.heating
    }

    /// Log-likelihood of the last accepted state.
    pub fn ln_likelihood(&self) -> f64 {
        self.ln_likelihood
    }

    /// Log prior of the last accepted state.
    pub fn ln_prior(&self) -> f64 {
        self.ln_prior
    }

    /// Heated log posterior of the last accepted state.
    pub fn ln_posterior(&self) -> f64 {
        self.heating * (self.ln_likelihood + self.ln_prior)
    }

    /// Computes the log-likelihood of the current tree, using the root tip's
    /// neighbor as likelihood root.
    ///
    /// # Errors
    /// Propagates [LikelihoodError]s of the evaluator.
    pub fn compute_ln_likelihood(&mut self) -> Result<f64, LikelihoodError> {
        let root = self.tree.root().ok_or(LikelihoodError::EmptyTree)?;
        self.evaluator.compute_log_likelihood(&self.tree, root)
    }

    /// Computes the log prior of the current tree.
    pub fn compute_ln_prior(&self) -> f64 {
        self.prior.ln_prior(&self.tree)
    }

    pub(crate) fn set_accepted(&mut self, ln_likelihood: f64, ln_prior: f64) {
        self.ln_likelihood = ln_likelihood;
        self.ln_prior = ln_prior;
    }
}

impl fmt::Debug for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainState")
            .field("num_nodes", &self.tree.num_nodes())
            .field("heating", &self.heating)
            .field("ln_likelihood", &self.ln_likelihood)
            .field("ln_prior", &self.ln_prior)
            .finish()
    }
}

// =#========================================================================#=
// MOVE
// =#========================================================================#=
/// A Metropolis-Hastings proposal on a [ChainState].
///
/// Implementors must leave the tree and the evaluator's CLA slots exactly
/// as they were when [revert](Move::revert) follows
/// [propose_new_state](Move::propose_new_state).
pub trait Move: fmt::Debug {
    /// Short name for reports.
    fn name(&self) -> &str;

    fn status(&self) -> MoveStatus;

    /// Changes the state, records what is needed to undo the change and
    /// invalidates the affected CLAs.
    ///
    /// # Panics
    /// Panics if a proposal is already pending.
    fn propose_new_state(&mut self, state: &mut ChainState);

    /// Log Hastings ratio of the pending proposal.
    fn ln_hastings_ratio(&self) -> f64;

    /// Log Jacobian of the pending proposal.
    fn ln_jacobian(&self) -> f64 {
        0.0
    }

    /// Commits the pending proposal.
    ///
    /// # Panics
    /// Panics if nothing was proposed.
    fn accept(&mut self, state: &mut ChainState);

    /// Undoes the pending proposal without recomputing likelihoods.
    ///
    /// # Panics
    /// Panics if nothing was proposed.
    fn revert(&mut self, state: &mut ChainState);

    /// Runs one propose, evaluate, accept-or-revert cycle.
    ///
    /// # Returns
    /// `true` if the proposal was accepted
    ///
    /// # Errors
    /// If the likelihood of the proposed state cannot be computed, the
    /// proposal is reverted and the error returned.
    fn update(&mut self, state: &mut ChainState) -> Result<bool, ChainError> {
        let previous = state.ln_posterior();
        self.propose_new_state(state);

        let ln_likelihood = match state.compute_ln_likelihood() {
            Ok(value) => value,
            Err(err) => {
                self.revert(state);
                return Err(err.into());
            }
        };
        let ln_prior = state.compute_ln_prior();
        let current = state.heating() * (ln_likelihood + ln_prior);
        let ln_accept_ratio = current - previous + self.ln_hastings_ratio() + self.ln_jacobian();

        let accepted = ln_accept_ratio >= 0.0
            || (ln_accept_ratio > f64::NEG_INFINITY && state.rng().uniform().ln() <= ln_accept_ratio);
        trace!(
            move_name = self.name(),
            ln_likelihood,
            ln_accept_ratio,
            accepted,
            "metropolis-hastings step"
        );
        if accepted {
            state.set_accepted(ln_likelihood, ln_prior);
            self.accept(state);
        } else {
            self.revert(state);
        }
        Ok(accepted)
    }
}
