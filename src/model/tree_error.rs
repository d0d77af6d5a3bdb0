//! Structural errors of tree operations.

use crate::model::node::NodeId;

/// Errors signalling a bad tree structure or definition.
///
/// Every operation returning a [TreeError] validates before it mutates, so the
/// tree is left exactly as it was before the failed call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist or is not in use")]
    UnknownNode(NodeId),

    #[error("cannot reroot at node {0}: it is not a leaf")]
    RerootAtInternal(NodeId),

    #[error("cannot detach the structural root {0}")]
    DetachRoot(NodeId),

    #[error("node {0} is still attached; detach it first")]
    StillAttached(NodeId),

    #[error("node {0} is not attached to any parent")]
    NotAttached(NodeId),

    #[error("node {0} still has children")]
    HasChildren(NodeId),

    #[error("cannot attach node {node} below {parent}: {parent} lies in the subtree of {node}")]
    WouldCreateCycle { node: NodeId, parent: NodeId },

    #[error("node {sibling} is not a child of {parent}")]
    NotAChild { sibling: NodeId, parent: NodeId },

    #[error("cannot swap {0} and {1}: {2}")]
    InvalidSwap(NodeId, NodeId, &'static str),

    #[error("cannot swap across polytomy at {0}: {1}")]
    InvalidPolytomySwap(NodeId, &'static str),

    #[error("tree has no nodes")]
    Empty,

    #[error("invalid tree definition: {0}")]
    InvalidDefinition(String),
}
