//! Rescaling of a single edge length.

use crate::config::{DEFAULT_EDGE_MOVE_LAMBDA, DEFAULT_MIN_EDGE_LENGTH};
use crate::mcmc::move_engine::{ChainState, Move, MoveStatus};
use crate::model::{EdgeLength, NodeId, Tree};
use tracing::trace;

/// Multiplies the length `m` of a random edge by `exp(λ(u - 0.5))` for a
/// uniform `u`, giving the proposal `m*` with Hastings ratio `m*/m`.
#[derive(Debug, Clone)]
pub struct EdgeMove {
    lambda: f64,
    min_edge_length: f64,
    status: MoveStatus,
    node: Option<NodeId>,
    orig_length: f64,
    new_length: f64,
}

impl EdgeMove {
    /// # Panics
    /// Panics if `lambda` is not positive.
    pub fn new(lambda: f64) -> Self {
        assert!(lambda > 0.0, "Tuning parameter must be positive, got {lambda}");
        EdgeMove {
            lambda,
            min_edge_length: DEFAULT_MIN_EDGE_LENGTH,
            status: MoveStatus::Idle,
            node: None,
            orig_length: 0.0,
            new_length: 0.0,
        }
    }

    pub fn with_min_edge_length(mut self, min_edge_length: f64) -> Self {
        self.min_edge_length = min_edge_length;
        self
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Node below the edge of the last proposal.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Proposes multiplying the edge above `node` by `multiplier`.
    ///
    /// # Panics
    /// Panics if a proposal is pending or `node` has no parent.
    pub fn propose_for(&mut self, state: &mut ChainState, node: NodeId, multiplier: f64) {
        assert!(!self.status.is_pending(), "Edge move already has a pending proposal");
        let (tree, evaluator) = state.tree_and_evaluator();
        assert!(tree.parent(node).is_some(), "Node {node} has no edge to rescale");

        evaluator.begin_proposal();
        self.orig_length = tree.edge_length(node).unwrap_or(self.min_edge_length);
        self.new_length = EdgeLength::clamped(self.orig_length * multiplier, self.min_edge_length).value();
        tree.set_edge_length(node, self.new_length);
        evaluator.invalidate_away_from(tree, node);

        trace!(node, from = self.orig_length, to = self.new_length, "edge move proposed");
        self.node = Some(node);
        self.status = MoveStatus::Proposed;
    }

    fn finish(&mut self, outcome: MoveStatus) -> NodeId {
        assert!(self.status.is_pending(), "Edge move has no pending proposal");
        self.status = outcome;
        match self.node {
            Some(node) => node,
            None => unreachable!("pending edge move without a node"),
        }
    }
}

impl Default for EdgeMove {
    fn default() -> Self {
        Self::new(DEFAULT_EDGE_MOVE_LAMBDA)
    }
}

impl Move for EdgeMove {
    fn name(&self) -> &str {
        "edge"
    }

    fn status(&self) -> MoveStatus {
        self.status
    }

    fn propose_new_state(&mut self, state: &mut ChainState) {
        let node = random_edge(state);
        let u = state.rng().uniform();
        self.propose_for(state, node, (self.lambda * (u - 0.5)).exp());
    }

    fn ln_hastings_ratio(&self) -> f64 {
        (self.new_length / self.orig_length).ln()
    }

    fn accept(&mut self, state: &mut ChainState) {
        self.finish(MoveStatus::Accepted);
        state.evaluator_mut().discard_cache();
    }

    fn revert(&mut self, state: &mut ChainState) {
        let node = self.finish(MoveStatus::Reverted);
        let (tree, evaluator) = state.tree_and_evaluator();
        tree.set_edge_length(node, self.orig_length);
        evaluator.restore_from_cache();
    }
}

/// Picks a uniformly random edge, identified by the node below it.
pub(crate) fn random_edge(state: &mut ChainState) -> NodeId {
    let edges = edge_nodes(state.tree());
    let k = state.rng().sample_uniform_int(edges.len());
    edges[k]
}

/// Nodes below an edge, in preorder.
pub(crate) fn edge_nodes(tree: &Tree) -> Vec<NodeId> {
    tree.preorder_iter().filter(|&id| tree.parent(id).is_some()).collect()
}
