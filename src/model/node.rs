//! Node record of the tree arena and the [EdgeLength] newtype.

use crate::model::taxon_table::TaxonIndex;
use std::ops::Deref;

/// Index of a node in a tree (arena).
///
/// Indices are stable for the lifetime of a node: topology edits move
/// nodes around by rewiring indices, never by relocating them.
pub type NodeId = usize;

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// A node of a [Tree](crate::model::Tree).
///
/// Children form a singly linked list starting at `left_child` and continuing
/// through `right_sib`, which allows arbitrary branching (polytomies).
/// The preorder threads (`next_preorder`, `prev_preorder`) linearize the tree
/// and are maintained by every structural operation of the tree.
///
/// # Invariants
/// - The structural root has no `parent` and no `prev_preorder`.
/// - `edge_length` is the length of the edge to `parent`; `None` for the root.
/// - `taxon` is set for nodes carrying observed data (tips).
/// - Nodes on the free list have `in_use == false` and no links at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left_child: Option<NodeId>,
    pub(crate) right_sib: Option<NodeId>,
    pub(crate) next_preorder: Option<NodeId>,
    pub(crate) prev_preorder: Option<NodeId>,
    pub(crate) edge_length: Option<EdgeLength>,
    pub(crate) taxon: Option<TaxonIndex>,
    pub(crate) in_use: bool,
}

impl Node {
    /// Creates a new unlinked node.
    pub(crate) fn new(id: NodeId, edge_length: Option<EdgeLength>, taxon: Option<TaxonIndex>) -> Self {
        Node {
            id,
            parent: None,
            left_child: None,
            right_sib: None,
            next_preorder: None,
            prev_preorder: None,
            edge_length,
            taxon,
            in_use: true,
        }
    }

    /// Clears all links and payload, marking the node as free.
    pub(crate) fn clear(&mut self) {
        *self = Node::new(self.id, None, None);
        self.in_use = false;
    }

    /// Returns the index of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the index of the parent, or `None` for the structural root
    /// (and for detached subtree roots).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the index of the leftmost child, if any.
    pub fn left_child(&self) -> Option<NodeId> {
        self.left_child
    }

    /// Returns the index of the immediate right sibling, if any.
    pub fn right_sib(&self) -> Option<NodeId> {
        self.right_sib
    }

    /// Returns the next node in preorder, if any.
    pub fn next_preorder(&self) -> Option<NodeId> {
        self.next_preorder
    }

    /// Returns the previous node in preorder, if any.
    pub fn prev_preorder(&self) -> Option<NodeId> {
        self.prev_preorder
    }

    /// Returns the length of the edge to the parent.
    pub fn edge_length(&self) -> Option<EdgeLength> {
        self.edge_length
    }

    /// Returns the taxon this node carries data for, if any.
    pub fn taxon(&self) -> Option<TaxonIndex> {
        self.taxon
    }

    /// Returns `true` if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left_child.is_none()
    }

    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` if this node is part of a tree (not on the free list).
    pub fn is_in_use(&self) -> bool {
        self.in_use
    }
}

// =#========================================================================#=
// EDGE LENGTH
// =#========================================================================#=
/// Length of the edge between a node and its parent, enforced non-negative.
///
/// The value is guaranteed to be non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct EdgeLength(f64);

impl EdgeLength {
    /// Creates a new edge length.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn new(length: f64) -> Self {
        assert!(length >= 0.0, "Edge length must be non-negative, got {}", length);
        assert!(length.is_finite(), "Edge length must be finite, got {}", length);
        EdgeLength(length)
    }

    /// Creates an edge length, clamping it up to `floor`.
    ///
    /// Proposals can drive lengths towards zero; the likelihood machinery
    /// expects strictly positive lengths.
    pub fn clamped(length: f64, floor: f64) -> Self {
        if length.is_nan() || length < floor {
            EdgeLength(floor)
        } else {
            EdgeLength::new(length)
        }
    }

    /// Returns the raw value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Deref for EdgeLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
