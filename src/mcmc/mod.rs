//! Metropolis-Hastings moves on trees and a chain driving them.
//!
//! Moves edit the tree of a [ChainState], tell its
//! [LikelihoodEvaluator](crate::likelihood::LikelihoodEvaluator) what became
//! stale and, on rejection, undo both without recomputing anything:
//! - [EdgeMove]: rescales one edge
//! - [LargetSimonMove]: rescales a path of three edges and may swap subtrees
//! - [TreeScalerMove]: rescales all edges by a common factor

pub mod chain;
pub mod edge_move;
pub mod error;
pub mod larget_simon;
pub mod move_engine;
pub mod prior;
pub mod rng;
pub mod tree_scaler;

pub use chain::{Chain, MoveStats};
pub use edge_move::EdgeMove;
pub use error::ChainError;
pub use larget_simon::{LargetSimonMove, LocalSwap};
pub use move_engine::{ChainState, Move, MoveStatus};
pub use prior::{ExponentialEdgePrior, FlatPrior, Prior};
pub use rng::RandomSource;
pub use tree_scaler::TreeScalerMove;
