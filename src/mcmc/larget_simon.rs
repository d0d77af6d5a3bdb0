//! The LOCAL move of Larget and Simon (1999), generalized to polytomies.
//!
//! ```text
//!      X  c  d
//!       \ | /
//!        \|/
//!   a  b  Y
//!    \ | /
//!     \|/
//!      U
//!      |
//!      Z  (or a child of U other than Y)
//! ```
//!
//! An internal node Y whose parent U is not the root tip is picked, with X a
//! random child of Y and Z either U's parent or a random other child of U.
//! The path Z-U-Y-X of length `m` is rescaled to `m*`, then either Y or U
//! slides to a uniform point on the path. If it slides past the other one,
//! X and Z trade places, which is a nearest-neighbor interchange.

use crate::config::{DEFAULT_LARGET_SIMON_LAMBDA, DEFAULT_MIN_EDGE_LENGTH};
use crate::mcmc::edge_move::random_edge;
use crate::mcmc::move_engine::{ChainState, Move, MoveStatus};
use crate::model::{EdgeLength, NodeId, Tree};
use tracing::trace;

/// Which tree surgery a proposal applied, needed to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSwap {
    /// Only edge lengths changed.
    None,
    /// X and a sibling Z of Y traded places.
    Nodes(NodeId, NodeId),
    /// X crossed over to the parent side of U.
    AcrossPolytomy(NodeId),
}

/// Nodes and original lengths of a pending three-edge proposal.
#[derive(Debug, Clone, Copy)]
struct Segment {
    x: NodeId,
    y: NodeId,
    u: NodeId,
    /// Node below the third edge: a child of U, or U itself.
    z: NodeId,
    orig: [f64; 3],
    swap: LocalSwap,
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Segment(Segment),
    /// Star tree: a single edge was rescaled.
    Star { node: NodeId, orig: f64 },
}

// =#========================================================================#=
// LARGET SIMON MOVE
// =#========================================================================#=
/// Local tree move changing three contiguous edge lengths and possibly the
/// topology.
///
/// The Hastings ratio is `(m*/m)^3`. On the star tree no path of three
/// edges exists, and the move rescales a single random edge instead (Hastings
/// ratio `m*/m`).
#[derive(Debug, Clone)]
pub struct LargetSimonMove {
    lambda: f64,
    min_edge_length: f64,
    status: MoveStatus,
    pending: Option<Pending>,
    ln_hastings: f64,
    num_topology_changes: usize,
}

impl LargetSimonMove {
    /// # Panics
    /// Panics if `lambda` is not positive.
    pub fn new(lambda: f64) -> Self {
        assert!(lambda > 0.0, "Tuning parameter must be positive, got {lambda}");
        LargetSimonMove {
            lambda,
            min_edge_length: DEFAULT_MIN_EDGE_LENGTH,
            status: MoveStatus::Idle,
            pending: None,
            ln_hastings: 0.0,
            num_topology_changes: 0,
        }
    }

    pub fn with_min_edge_length(mut self, min_edge_length: f64) -> Self {
        self.min_edge_length = min_edge_length;
        self
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Surgery applied by the last proposal, `None` for a star-tree proposal.
    pub fn last_swap(&self) -> Option<LocalSwap> {
        match self.pending {
            Some(Pending::Segment(segment)) => Some(segment.swap),
            _ => None,
        }
    }

    /// Nodes below the three edges `[X, Y, Z]` of the last segment proposal.
    pub fn last_segment(&self) -> Option<[NodeId; 3]> {
        match self.pending {
            Some(Pending::Segment(segment)) => Some([segment.x, segment.y, segment.z]),
            _ => None,
        }
    }

    /// Number of proposals so far that changed the topology.
    pub fn num_topology_changes(&self) -> usize {
        self.num_topology_changes
    }

    fn multiplier(&self, state: &mut ChainState) -> f64 {
        (self.lambda * (state.rng().uniform() - 0.5)).exp()
    }

    fn clamp(&self, length: f64) -> f64 {
        EdgeLength::clamped(length, self.min_edge_length).value()
    }

    fn propose_star(&mut self, state: &mut ChainState) {
        let node = random_edge(state);
        let multiplier = self.multiplier(state);
        let (tree, evaluator) = state.tree_and_evaluator();
        let orig = tree.edge_length(node).unwrap_or(self.min_edge_length);
        let length = self.clamp(orig * multiplier);
        tree.set_edge_length(node, length);
        evaluator.invalidate_away_from(tree, node);

        self.ln_hastings = (length / orig).ln();
        self.pending = Some(Pending::Star { node, orig });
    }

    fn propose_segment(&mut self, state: &mut ChainState) {
        let candidates = segment_candidates(state.tree());
        let y = candidates[state.rng().sample_uniform_int(candidates.len())];
        let tree = state.tree();
        let children: Vec<NodeId> = tree.children(y).collect();
        let u = tree.parent(y).unwrap_or(y);
        let others: Vec<NodeId> = tree.children(u).filter(|&c| c != y).collect();
        let num_u_children = others.len() + 1;

        let x = children[state.rng().sample_uniform_int(children.len())];
        // Index 0 stands for the edge from U to its parent
        let which = state.rng().sample_uniform_int(num_u_children);
        let z = if which == 0 { u } else { others[which - 1] };

        let tree = state.tree();
        let length = |node: NodeId| tree.edge_length(node).unwrap_or(0.0);
        let orig = [length(x), length(y), length(z)];
        let m = orig.iter().sum::<f64>();
        let mstar = m * self.multiplier(state);
        let scale = mstar / m;
        let [x_len, y_len, z_len] = orig.map(|len| len * scale);
        let xstar = state.rng().uniform() * mstar;
        let moving_y = state.rng().uniform() >= 0.5;

        let (new_lengths, swap) = if moving_y && xstar <= x_len + y_len {
            ([xstar, x_len + y_len - xstar, z_len], LocalSwap::None)
        } else if !moving_y && xstar <= y_len + z_len {
            ([x_len, y_len + z_len - xstar, xstar], LocalSwap::None)
        } else {
            let swap = if z == u { LocalSwap::AcrossPolytomy(x) } else { LocalSwap::Nodes(x, z) };
            if moving_y {
                ([x_len + y_len, xstar - x_len - y_len, x_len + y_len + z_len - xstar], swap)
            } else {
                ([x_len + y_len + z_len - xstar, xstar - y_len - z_len, y_len + z_len], swap)
            }
        };

        let (tree, evaluator) = state.tree_and_evaluator();
        if swap != LocalSwap::None {
            apply_swap(tree, swap);
        }
        let mut applied = 0.0;
        for (node, length) in [x, y, z].into_iter().zip(new_lengths) {
            let length = self.clamp(length);
            tree.set_edge_length(node, length);
            applied += length;
        }
        if swap == LocalSwap::None {
            for node in [x, y, z] {
                evaluator.invalidate_away_from(tree, node);
            }
        } else {
            // Slots around U and Y now describe different clades
            evaluator.invalidate_all_away_from(tree, u);
            evaluator.invalidate_both_ends(tree, y);
            self.num_topology_changes += 1;
        }

        trace!(x, y, u, z, m, mstar = applied, ?swap, "local move proposed");
        // Ratio of the lengths actually set, after clamping
        self.ln_hastings = 3.0 * (applied / m).ln();
        self.pending = Some(Pending::Segment(Segment { x, y, u, z, orig, swap }));
    }

    fn finish(&mut self, outcome: MoveStatus) -> Pending {
        assert!(self.status.is_pending(), "Local move has no pending proposal");
        self.status = outcome;
        match self.pending {
            Some(pending) => pending,
            None => unreachable!("pending local move without a record"),
        }
    }
}

impl Default for LargetSimonMove {
    fn default() -> Self {
        Self::new(DEFAULT_LARGET_SIMON_LAMBDA)
    }
}

impl Move for LargetSimonMove {
    fn name(&self) -> &str {
        "larget-simon"
    }

    fn status(&self) -> MoveStatus {
        self.status
    }

    /// # Panics
    /// Panics if a proposal is pending or the tree is not rooted at a tip.
    fn propose_new_state(&mut self, state: &mut ChainState) {
        assert!(!self.status.is_pending(), "Local move already has a pending proposal");
        let tree = state.tree();
        assert!(tree.root().is_some_and(|root| tree.is_tip(root)), "Local move needs a tree rooted at a tip");

        state.evaluator_mut().begin_proposal();
        if state.tree().num_internals() == 1 {
            self.propose_star(state);
        } else {
            self.propose_segment(state);
        }
        self.status = MoveStatus::Proposed;
    }

    fn ln_hastings_ratio(&self) -> f64 {
        self.ln_hastings
    }

    fn accept(&mut self, state: &mut ChainState) {
        self.finish(MoveStatus::Accepted);
        state.evaluator_mut().discard_cache();
    }

    fn revert(&mut self, state: &mut ChainState) {
        let pending = self.finish(MoveStatus::Reverted);
        let (tree, evaluator) = state.tree_and_evaluator();
        match pending {
            Pending::Star { node, orig } => tree.set_edge_length(node, orig),
            Pending::Segment(segment) => {
                if segment.swap != LocalSwap::None {
                    apply_swap(tree, segment.swap);
                }
                for (node, length) in [segment.x, segment.y, segment.z].into_iter().zip(segment.orig) {
                    tree.set_edge_length(node, length);
                }
                debug_assert_eq!(tree.parent(segment.y), Some(segment.u));
            }
        }
        evaluator.restore_from_cache();
    }
}

/// Internal nodes whose parent is not the root tip, in preorder.
fn segment_candidates(tree: &Tree) -> Vec<NodeId> {
    tree.preorder_iter()
        .filter(|&id| tree.is_internal(id))
        .filter(|&id| tree.parent(id).is_some_and(|parent| !tree.is_tip(parent)))
        .collect()
}

/// Applies a swap; every swap is its own inverse.
///
/// # Panics
/// Panics if the tree rejects the swap, which the node selection rules out.
fn apply_swap(tree: &mut Tree, swap: LocalSwap) {
    let result = match swap {
        LocalSwap::None => Ok(()),
        LocalSwap::Nodes(a, b) => tree.swap_nodes(a, b),
        LocalSwap::AcrossPolytomy(node) => tree.swap_across_polytomy(node),
    };
    if let Err(err) = result {
        panic!("Local move selected an invalid swap: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_skip_root_adjacent_node() {
        // Rooted at the tip Kea; its neighbor is not a candidate
        let mut tree = Tree::from_newick("((Kea:0.1,Kaka:0.2):0.3,(Tui:0.1,Weka:0.4):0.2);").unwrap();
        let kea = tree.first_leaf().unwrap();
        tree.reroot_at(kea).unwrap();
        let candidates = segment_candidates(&tree);
        assert_eq!(candidates.len(), tree.num_internals() - 1);
        for id in candidates {
            assert_ne!(tree.parent(id), tree.root());
        }
    }
}
