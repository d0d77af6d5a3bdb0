//! Tree-surgery primitives used by topology-changing moves.
//!
//! Both swaps are their own inverse: calling them a second time with the same
//! arguments restores the previous topology, threads included. Edge lengths
//! stay with their nodes.

use crate::model::node::NodeId;
use crate::model::tree::{ChildPosition, Tree};
use crate::model::tree_error::TreeError;

impl Tree {
    /// Exchanges the positions of `a` and `b`, each taking the other's place
    /// (parent and sibling slot). Their subtrees travel with them.
    ///
    /// # Errors
    /// Fails without modifying the tree if
    /// - either node is unknown or has no parent,
    /// - both share the same parent, or
    /// - one lies in the subtree of the other.
    ///
    /// # Example
    /// ```
    /// use phylik::model::Tree;
    ///
    /// let mut tree = Tree::from_newick("((Kea:1,Kaka:1):1,(Tui:1,Weka:1):1);").unwrap();
    /// let kea = tree.find_tip(tree.taxa().index_of("Kea").unwrap()).unwrap();
    /// let tui = tree.find_tip(tree.taxa().index_of("Tui").unwrap()).unwrap();
    /// tree.swap_nodes(kea, tui).unwrap();
    /// assert_eq!(tree.to_newick(), "((Tui:1,Kaka:1):1,(Kea:1,Weka:1):1);");
    /// ```
    pub fn swap_nodes(&mut self, a: NodeId, b: NodeId) -> Result<(), TreeError> {
        self.check_node(a)?;
        self.check_node(b)?;
        let (Some(parent_a), Some(parent_b)) = (self.parent(a), self.parent(b)) else {
            return Err(TreeError::InvalidSwap(a, b, "both nodes need a parent"));
        };
        if parent_a == parent_b {
            return Err(TreeError::InvalidSwap(a, b, "nodes are siblings"));
        }
        if self.is_in_clade(a, b) || self.is_in_clade(b, a) {
            return Err(TreeError::InvalidSwap(a, b, "one node lies in the subtree of the other"));
        }

        let position_a = self.position_of(a);
        let position_b = self.position_of(b);
        self.detach_unchecked(a);
        self.detach_unchecked(b);
        self.attach_unchecked(parent_a, b, position_a);
        self.attach_unchecked(parent_b, a, position_b);
        self.bump_topology();
        Ok(())
    }

    /// Moves `swap`'s parent V across its own parent U: all children of U
    /// other than V and all children of V other than `swap` trade places,
    /// keeping their left-to-right order around V and `swap` respectively.
    ///
    /// In unrooted terms this exchanges `swap` with the subtree on the far
    /// side of U, which is the swap a local move needs when that subtree
    /// hangs above U rather than beside it. The exchange is done one child at
    /// a time, so junctions with more than two children are handled.
    ///
    /// # Errors
    /// Fails without modifying the tree if `swap` is unknown, has no parent,
    /// or its parent has no parent.
    pub fn swap_across_polytomy(&mut self, swap: NodeId) -> Result<(), TreeError> {
        self.check_node(swap)?;
        let v = self
            .parent(swap)
            .ok_or(TreeError::InvalidPolytomySwap(swap, "node has no parent"))?;
        let u = self
            .parent(v)
            .ok_or(TreeError::InvalidPolytomySwap(swap, "parent of node has no parent"))?;

        // Original outermost children of U, with `swap` standing in for V
        let substitute = |id: NodeId| if id == v { swap } else { id };
        let leftmost = self.left_child(u).map(substitute);
        let rightmost = self.rightmost_child(u).map(substitute);

        // U's other children move down beside `swap`
        while self.left_child(u) != Some(v) {
            self.shift_leftmost_child(u, swap);
        }
        while self.right_sib(v).is_some() {
            self.shift_rightmost_child(u, swap);
        }
        // V's original other children move up beside V
        while self.left_child(v) != leftmost {
            self.shift_leftmost_child(v, v);
        }
        if let Some(rightmost) = rightmost {
            while self.right_sib(rightmost).is_some() {
                self.shift_rightmost_child(v, v);
            }
        }

        self.bump_topology();
        Ok(())
    }

    /// Makes the leftmost child of `parent` the immediate left sibling of `anchor`.
    ///
    /// # Errors
    /// Fails without modifying the tree if `parent` has no children, its
    /// leftmost child is `anchor`, `anchor` has no parent, or the move would
    /// put the child inside its own subtree.
    pub fn move_leftmost_child_to_left_sibling(
        &mut self,
        parent: NodeId,
        anchor: NodeId,
    ) -> Result<(), TreeError> {
        self.check_node(parent)?;
        let child = self.left_child(parent).ok_or(TreeError::NotAttached(parent))?;
        self.check_shift(child, anchor)?;
        self.shift_leftmost_child(parent, anchor);
        self.bump_topology();
        Ok(())
    }

    /// Makes the rightmost child of `parent` the immediate right sibling of `anchor`.
    ///
    /// # Errors
    /// Same conditions as [`move_leftmost_child_to_left_sibling`](Tree::move_leftmost_child_to_left_sibling).
    pub fn move_rightmost_child_to_right_sibling(
        &mut self,
        parent: NodeId,
        anchor: NodeId,
    ) -> Result<(), TreeError> {
        self.check_node(parent)?;
        let child = self.rightmost_child(parent).ok_or(TreeError::NotAttached(parent))?;
        self.check_shift(child, anchor)?;
        self.shift_rightmost_child(parent, anchor);
        self.bump_topology();
        Ok(())
    }

    fn check_shift(&self, child: NodeId, anchor: NodeId) -> Result<(), TreeError> {
        self.check_node(anchor)?;
        let target = self.parent(anchor).ok_or(TreeError::NotAttached(anchor))?;
        if child == anchor || self.is_in_clade(target, child) {
            return Err(TreeError::WouldCreateCycle { node: child, parent: target });
        }
        Ok(())
    }

    fn shift_leftmost_child(&mut self, parent: NodeId, anchor: NodeId) {
        if let (Some(child), Some(target)) = (self.left_child(parent), self.parent(anchor)) {
            self.detach_unchecked(child);
            self.attach_unchecked(target, child, ChildPosition::LeftOf(anchor));
        }
    }

    fn shift_rightmost_child(&mut self, parent: NodeId, anchor: NodeId) {
        if let (Some(child), Some(target)) = (self.rightmost_child(parent), self.parent(anchor)) {
            self.detach_unchecked(child);
            self.attach_unchecked(target, child, ChildPosition::RightOf(anchor));
        }
    }
}
