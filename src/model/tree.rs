//! Provides the threaded tree representation.
//!
//! Provides core data structures for representing phylogenetic trees:
//! * [Tree] - arena of [Node]s with parent/left-child/right-sibling links
//!   and preorder threads, supporting polytomies
//! * [ChildPosition] - where [`Tree::attach_as_child`] inserts a subtree
//! * [PreorderIter] / [PostorderIter] - iterators following the threads

use crate::model::node::{EdgeLength, Node, NodeId};
use crate::model::taxon_table::{TaxonIndex, TaxonTable};
use crate::model::tree_error::TreeError;
use crate::newick;
use crate::parser::ParsingError;

// =$========================================================================$=
// TREE
// =$========================================================================$=
/// A phylogenetic tree represented using the arena pattern on [Node].
///
/// Nodes are stored in a contiguous vector and referenced by [NodeId].
/// Deleted nodes go onto a free list and their slots are reused by
/// [`create_node`](Tree::create_node), so repeated topology edits do not
/// reallocate.
///
/// # Structure
/// - Exactly one node (the structural root) has no parent. Nodes that were
///   detached and not yet reattached form loose subtrees; they are in use
///   but not reachable from the root.
/// - Children of a node form a sibling list, so any node may have any
///   number of children.
/// - Preorder threads are kept consistent with the link structure by every
///   structural operation; postorder is the reverse of preorder.
/// - Tips (nodes with data) refer to taxa of the [TaxonTable] carried by
///   the tree. Nodes never refer to the table themselves.
///
/// # Construction
/// Create nodes, wire them with [`attach_as_child`](Tree::attach_as_child)
/// and declare the root with [`set_root`](Tree::set_root), or parse a
/// Newick string with [`Tree::from_newick`].
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    taxa: TaxonTable,
    topology_id: u64,
}

/// Where a subtree is inserted among the children of its new parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPosition {
    /// Becomes the leftmost child.
    Leftmost,
    /// Becomes the rightmost child.
    Rightmost,
    /// Becomes the immediate left sibling of the given child.
    LeftOf(NodeId),
    /// Becomes the immediate right sibling of the given child.
    RightOf(NodeId),
}

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl Tree {
    /// Creates an empty tree over the given taxa.
    pub fn new(taxa: TaxonTable) -> Self {
        Tree {
            nodes: Vec::with_capacity(2 * taxa.len()),
            free: Vec::new(),
            root: None,
            taxa,
            topology_id: 0,
        }
    }

    /// Parses a single Newick string into a tree, registering its leaf
    /// labels in a fresh [TaxonTable].
    ///
    /// See [`newick::parse_str`] for details.
    pub fn from_newick<S: AsRef<str>>(newick: S) -> Result<Tree, ParsingError> {
        newick::parse_str(newick)
    }

    /// Returns the Newick representation of this tree.
    pub fn to_newick(&self) -> String {
        newick::to_newick(self)
    }

    /// Returns the taxon table of this tree.
    pub fn taxa(&self) -> &TaxonTable {
        &self.taxa
    }

    /// Returns a mutable reference to the taxon table, e.g. to register
    /// taxa while building the tree by hand.
    pub fn taxa_mut(&mut self) -> &mut TaxonTable {
        &mut self.taxa
    }

    /// Returns the structural root, or `None` if not set yet.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns a counter that changes with every structural edit.
    ///
    /// Anything derived from the topology (splits, tree ids) keyed on this
    /// value is invalidated by attach, detach, swap and reroot.
    pub fn topology_id(&self) -> u64 {
        self.topology_id
    }

    /// Returns the number of node slots in the arena, including free ones.
    ///
    /// Every [NodeId] handed out is smaller than this.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a reference to the node at the given index.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Returns `true` if `id` refers to a node in use.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.in_use)
    }

    /// Returns the parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Returns the leftmost child of `id`.
    pub fn left_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].left_child
    }

    /// Returns the immediate right sibling of `id`.
    pub fn right_sib(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].right_sib
    }

    /// Returns the taxon of `id`, if it is a tip carrying data.
    pub fn taxon(&self, id: NodeId) -> Option<TaxonIndex> {
        self.nodes[id].taxon
    }

    /// Returns the length of the edge between `id` and its parent.
    pub fn edge_length(&self, id: NodeId) -> Option<f64> {
        self.nodes[id].edge_length.map(|e| *e)
    }

    /// Sets the length of the edge between `id` and its parent.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn set_edge_length(&mut self, id: NodeId, length: f64) {
        self.nodes[id].edge_length = Some(EdgeLength::new(length));
    }

    /// Returns an iterator over the children of `id`, left to right.
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter { tree: self, next: self.nodes[id].left_child }
    }

    /// Returns the number of children of `id`.
    pub fn count_children(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Returns all nodes adjacent to `id`: the parent first (if any),
    /// then the children from left to right.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id].parent.into_iter().chain(self.children(id))
    }

    /// Returns `true` if `id` is a tip: a node of degree one, that is a leaf
    /// or a root with a single child.
    pub fn is_tip(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        match node.left_child {
            None => true,
            Some(child) => node.parent.is_none() && self.nodes[child].right_sib.is_none(),
        }
    }

    /// Returns `true` if `id` is not a tip.
    pub fn is_internal(&self, id: NodeId) -> bool {
        !self.is_tip(id)
    }

    /// Returns the immediate left sibling of `id`, or `None` if it is a
    /// leftmost child (or has no parent).
    pub fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let mut current = self.nodes[parent].left_child?;
        if current == id {
            return None;
        }
        while let Some(next) = self.nodes[current].right_sib {
            if next == id {
                return Some(current);
            }
            current = next;
        }
        None
    }

    /// Returns the rightmost child of `id`, if any.
    pub fn rightmost_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last()
    }

    /// Returns the last node of the clade rooted at `id` in preorder,
    /// found by zig-zagging up the rightmost children.
    pub fn last_preorder_in_clade(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(rightmost) = self.rightmost_child(current) {
            current = rightmost;
        }
        current
    }

    /// Returns `true` if `id` lies in the clade rooted at `clade_root`
    /// (including `clade_root` itself).
    pub fn is_in_clade(&self, id: NodeId, clade_root: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == clade_root {
                return true;
            }
            current = self.nodes[node].parent;
        }
        false
    }

    /// Returns the number of nodes reachable from the root.
    pub fn num_nodes(&self) -> usize {
        self.preorder_iter().count()
    }

    /// Returns the number of tips reachable from the root.
    pub fn num_tips(&self) -> usize {
        self.preorder_iter().filter(|&id| self.is_tip(id)).count()
    }

    /// Returns the number of internal nodes reachable from the root.
    pub fn num_internals(&self) -> usize {
        self.preorder_iter().filter(|&id| self.is_internal(id)).count()
    }

    /// Returns the number of edges of the tree.
    pub fn num_edges(&self) -> usize {
        self.num_nodes().saturating_sub(1)
    }

    /// Returns the sum of all edge lengths.
    pub fn total_edge_length(&self) -> f64 {
        self.preorder_iter().filter_map(|id| self.edge_length(id)).sum()
    }

    /// Returns the tip carrying data for taxon `taxon`, if any.
    pub fn find_tip(&self, taxon: TaxonIndex) -> Option<NodeId> {
        self.preorder_iter().find(|&id| self.nodes[id].taxon == Some(taxon))
    }

    /// Returns the first leaf (childless node) in preorder, excluding the root.
    pub fn first_leaf(&self) -> Option<NodeId> {
        self.preorder_iter().find(|&id| self.nodes[id].is_leaf() && Some(id) != self.root)
    }
}

impl std::ops::Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

// ============================================================================
// Node lifecycle and construction (pub)
// ============================================================================
impl Tree {
    /// Creates a new detached node and returns its index, reusing a slot
    /// from the free list when one is available.
    ///
    /// # Arguments
    /// * `edge_length` - Length of the edge to the future parent
    /// * `taxon` - Taxon of the observed data, for tips
    ///
    /// # Panics
    /// Panics if `edge_length` is negative or not finite.
    pub fn create_node(&mut self, edge_length: Option<f64>, taxon: Option<TaxonIndex>) -> NodeId {
        let edge_length = edge_length.map(EdgeLength::new);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Node::new(id, edge_length, taxon);
                id
            }
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node::new(id, edge_length, taxon));
                id
            }
        }
    }

    /// Returns a detached, childless node to the free list.
    ///
    /// # Errors
    /// Fails if the node is unknown, the root, attached, or has children.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check_node(id)?;
        if self.root == Some(id) || self.nodes[id].parent.is_some() {
            return Err(TreeError::StillAttached(id));
        }
        if self.nodes[id].left_child.is_some() {
            return Err(TreeError::HasChildren(id));
        }
        self.nodes[id].clear();
        self.free.push(id);
        Ok(())
    }

    /// Returns the number of slots on the free list.
    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    /// Declares a detached node to be the structural root.
    ///
    /// # Errors
    /// Fails if a root is already set or the node has a parent.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check_node(id)?;
        if self.root.is_some() {
            return Err(TreeError::InvalidDefinition("root already set".to_string()));
        }
        if self.nodes[id].parent.is_some() {
            return Err(TreeError::StillAttached(id));
        }
        self.root = Some(id);
        self.nodes[id].edge_length = None;
        self.bump_topology();
        Ok(())
    }

    /// Inserts the detached subtree rooted at `node` as a child of `parent`,
    /// keeping the subtree intact and splicing its preorder thread into place.
    ///
    /// # Errors
    /// Fails without modifying the tree if either node is unknown, `node` is
    /// attached or the root, `parent` lies inside the subtree of `node`, or
    /// the sibling named by `position` is not a child of `parent`.
    pub fn attach_as_child(
        &mut self,
        parent: NodeId,
        node: NodeId,
        position: ChildPosition,
    ) -> Result<(), TreeError> {
        self.check_node(parent)?;
        self.check_node(node)?;
        if self.nodes[node].parent.is_some() || self.root == Some(node) {
            return Err(TreeError::StillAttached(node));
        }
        if self.is_in_clade(parent, node) {
            return Err(TreeError::WouldCreateCycle { node, parent });
        }
        if let ChildPosition::LeftOf(sibling) | ChildPosition::RightOf(sibling) = position {
            self.check_node(sibling)?;
            if self.nodes[sibling].parent != Some(parent) {
                return Err(TreeError::NotAChild { sibling, parent });
            }
        }
        self.attach_unchecked(parent, node, position);
        self.bump_topology();
        Ok(())
    }

    /// Removes the subtree rooted at `node` from its parent, keeping the
    /// subtree intact. The detached subtree keeps its internal preorder
    /// thread and can be reattached with [`attach_as_child`](Tree::attach_as_child).
    ///
    /// # Errors
    /// Fails without modifying the tree if `node` is unknown, the structural
    /// root, or already detached.
    pub fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.check_node(node)?;
        if self.root == Some(node) {
            return Err(TreeError::DetachRoot(node));
        }
        if self.nodes[node].parent.is_none() {
            return Err(TreeError::NotAttached(node));
        }
        self.detach_unchecked(node);
        self.bump_topology();
        Ok(())
    }

    /// Reroots the tree at the given leaf.
    ///
    /// Walks from the leaf to the structural root, each step making the
    /// "mover" (the node on the old parent side) the rightmost child of the
    /// "target" (the node on the child side), reversing one parent/child link
    /// at a time. Edge lengths travel with the edges, so the unrooted tree is
    /// unchanged.
    ///
    /// Runs in O(depth) apart from sibling lookups, which are linear in the
    /// number of children of the nodes on the path. Threads are spliced per
    /// step, never rebuilt.
    ///
    /// # Errors
    /// Fails without modifying the tree if `leaf` is unknown, not reachable
    /// from the root, or has children.
    pub fn reroot_at(&mut self, leaf: NodeId) -> Result<(), TreeError> {
        self.check_node(leaf)?;
        let root = self.root.ok_or(TreeError::Empty)?;
        if !self.is_in_clade(leaf, root) {
            return Err(TreeError::UnknownNode(leaf));
        }
        if self.nodes[leaf].left_child.is_some() {
            return Err(TreeError::RerootAtInternal(leaf));
        }
        if leaf == root {
            return Ok(());
        }

        let mut path = Vec::new();
        let mut current = self.nodes[leaf].parent;
        while let Some(node) = current {
            path.push(node);
            current = self.nodes[node].parent;
        }
        // Node following the clade of each path node in preorder; steps only
        // rearrange nodes inside that clade, so these stay correct
        let mut follows = vec![None; path.len()];
        for k in (0..path.len()).rev() {
            let above = follows.get(k + 1).copied().flatten();
            follows[k] = self.nodes[path[k]].right_sib.or(above);
        }

        let mut target = leaf;
        let mut clade_last = leaf;
        for (&mover, &follow) in path.iter().zip(&follows) {
            let mover_length = self.nodes[mover].edge_length;
            self.nodes[mover].edge_length = self.nodes[leaf].edge_length;
            self.nodes[leaf].edge_length = mover_length;

            clade_last = self.reroot_step(mover, target, leaf, clade_last, follow);
            target = mover;
        }
        self.bump_topology();
        Ok(())
    }

    /// Validates the link structure and the threads.
    ///
    /// Checks:
    /// - The root has no parent and no previous node in preorder
    /// - Every child points back to its parent
    /// - Following `next_preorder` from the root equals a stack-based
    ///   left-child/right-sibling preorder walk
    /// - Following `prev_preorder` from the last node yields the exact reverse
    ///
    /// # Returns
    /// `true` if the tree is consistent, `false` otherwise
    pub fn check_threading(&self) -> bool {
        let Some(root) = self.root else {
            return true;
        };
        let root_node = &self.nodes[root];
        if root_node.parent.is_some() || root_node.prev_preorder.is_some() {
            return false;
        }

        // Structural preorder walk
        let mut expected = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.nodes[id].in_use {
                return false;
            }
            expected.push(id);
            let children: Vec<NodeId> = self.children(id).collect();
            for &child in children.iter().rev() {
                if self.nodes[child].parent != Some(id) {
                    return false;
                }
                stack.push(child);
            }
            if expected.len() > self.nodes.len() {
                return false; // cycle
            }
        }

        // Threaded walk forwards
        let mut threaded = Vec::with_capacity(expected.len());
        let mut current = Some(root);
        while let Some(id) = current {
            threaded.push(id);
            if threaded.len() > expected.len() {
                return false;
            }
            current = self.nodes[id].next_preorder;
        }
        if threaded != expected {
            return false;
        }

        // Threaded walk backwards
        let mut backwards = Vec::with_capacity(expected.len());
        let mut current = expected.last().copied();
        while let Some(id) = current {
            backwards.push(id);
            if backwards.len() > expected.len() {
                return false;
            }
            current = self.nodes[id].prev_preorder;
        }
        backwards.reverse();
        backwards == expected
    }
}

// ============================================================================
// Structural helpers (private / crate)
// ============================================================================
impl Tree {
    /// Checks that `id` refers to a node in use.
    pub(crate) fn check_node(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(id))
        }
    }

    pub(crate) fn bump_topology(&mut self) {
        self.topology_id = self.topology_id.wrapping_add(1);
    }

    /// Splices the detached clade of `node` below `parent`; see [`Tree::attach_as_child`].
    pub(crate) fn attach_unchecked(&mut self, parent: NodeId, node: NodeId, position: ChildPosition) {
        let left = match position {
            ChildPosition::Leftmost => None,
            ChildPosition::Rightmost => self.rightmost_child(parent),
            ChildPosition::RightOf(sibling) => Some(sibling),
            ChildPosition::LeftOf(sibling) => self.left_sibling(sibling),
        };

        // Thread: clade goes right after `parent` or after the clade of its new left sibling
        let prev = match left {
            None => parent,
            Some(sibling) => self.last_preorder_in_clade(sibling),
        };
        let next = self.nodes[prev].next_preorder;
        let last = self.last_preorder_in_clade(node);
        self.nodes[prev].next_preorder = Some(node);
        self.nodes[node].prev_preorder = Some(prev);
        self.nodes[last].next_preorder = next;
        if let Some(next) = next {
            self.nodes[next].prev_preorder = Some(last);
        }

        // Sibling list
        match left {
            None => {
                self.nodes[node].right_sib = self.nodes[parent].left_child;
                self.nodes[parent].left_child = Some(node);
            }
            Some(sibling) => {
                self.nodes[node].right_sib = self.nodes[sibling].right_sib;
                self.nodes[sibling].right_sib = Some(node);
            }
        }
        self.nodes[node].parent = Some(parent);
    }

    /// Cuts the clade of `node` out of its parent; see [`Tree::detach`].
    pub(crate) fn detach_unchecked(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node].parent else {
            return;
        };
        let left = self.left_sibling(node);
        let right = self.nodes[node].right_sib;
        let prev = self.nodes[node].prev_preorder;
        let last = self.last_preorder_in_clade(node);
        let next = self.nodes[last].next_preorder;

        match left {
            None => self.nodes[parent].left_child = right,
            Some(sibling) => self.nodes[sibling].right_sib = right,
        }
        if let Some(prev) = prev {
            self.nodes[prev].next_preorder = next;
        }
        if let Some(next) = next {
            self.nodes[next].prev_preorder = prev;
        }

        self.nodes[node].parent = None;
        self.nodes[node].right_sib = None;
        self.nodes[node].prev_preorder = None;
        self.nodes[last].next_preorder = None;
    }

    /// Returns the position `node` occupies among its siblings, expressed
    /// relative to its left sibling so it survives moving `node` away.
    pub(crate) fn position_of(&self, node: NodeId) -> ChildPosition {
        match self.left_sibling(node) {
            None => ChildPosition::Leftmost,
            Some(sibling) => ChildPosition::RightOf(sibling),
        }
    }

    /// One step of [`Tree::reroot_at`]: `leaf`, a child of `mover`, takes
    /// the place of `mover`, which becomes the rightmost child of `target`.
    ///
    /// `target` ends the rightmost chain below `leaf`, so the clade of
    /// `leaf` ends with `clade_last` and `mover` goes right after it. With A
    /// the clades of the children of `mover` left of `leaf` and C those right
    /// of it, preorder changes from `mover A leaf.. C` to `leaf.. mover A C`.
    ///
    /// # Returns
    /// The new last node of the clade of `leaf`
    fn reroot_step(
        &mut self,
        mover: NodeId,
        target: NodeId,
        leaf: NodeId,
        clade_last: NodeId,
        follow: Option<NodeId>,
    ) -> NodeId {
        debug_assert_eq!(self.nodes[leaf].parent, Some(mover));
        let mover_parent = self.nodes[mover].parent;
        let mover_left = self.left_sibling(mover);
        let mover_right = self.nodes[mover].right_sib;
        let leaf_left = self.left_sibling(leaf);
        let leaf_right = self.nodes[leaf].right_sib;
        let target_last_child = self.rightmost_child(target);

        // Thread endpoints, read before any link changes
        let before = self.nodes[mover].prev_preorder;
        let after_clade = self.nodes[clade_last].next_preorder;
        // Last of A, or `mover` itself if A is empty
        let tail_a = self.nodes[leaf].prev_preorder.unwrap_or(mover);
        let new_last = match (leaf_right, follow) {
            (None, _) => tail_a,
            (Some(_), Some(follow)) => self.nodes[follow].prev_preorder.unwrap_or(tail_a),
            (Some(_), None) => match self.rightmost_child(mover) {
                Some(child) => self.last_preorder_in_clade(child),
                None => tail_a,
            },
        };

        // Threads
        if let Some(before) = before {
            self.nodes[before].next_preorder = Some(leaf);
        }
        self.nodes[leaf].prev_preorder = before;
        self.nodes[clade_last].next_preorder = Some(mover);
        self.nodes[mover].prev_preorder = Some(clade_last);
        self.nodes[tail_a].next_preorder = after_clade;
        if let Some(next) = after_clade {
            self.nodes[next].prev_preorder = Some(tail_a);
        }

        // `leaf` replaces `mover` among the children of its parent
        self.nodes[leaf].parent = mover_parent;
        self.nodes[leaf].right_sib = mover_right;
        match (mover_parent, mover_left) {
            (None, _) => self.root = Some(leaf),
            (Some(parent), None) => self.nodes[parent].left_child = Some(leaf),
            (Some(_), Some(sibling)) => self.nodes[sibling].right_sib = Some(leaf),
        }
        match leaf_left {
            None => self.nodes[mover].left_child = leaf_right,
            Some(sibling) => self.nodes[sibling].right_sib = leaf_right,
        }

        // `mover` becomes the rightmost child of `target`
        self.nodes[mover].parent = Some(target);
        self.nodes[mover].right_sib = None;
        match target_last_child {
            None => self.nodes[target].left_child = Some(mover),
            Some(child) => self.nodes[child].right_sib = Some(mover),
        }
        new_last
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl Tree {
    /// Returns the first node in preorder (the root).
    pub fn preorder_first(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node following `id` in preorder.
    pub fn preorder_next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next_preorder
    }

    /// Returns the first node in postorder (the last node in preorder).
    pub fn postorder_first(&self) -> Option<NodeId> {
        self.root.map(|root| self.last_preorder_in_clade(root))
    }

    /// Returns the node following `id` in postorder.
    ///
    /// Postorder is the reverse of preorder: every node comes after all of
    /// its descendants.
    pub fn postorder_next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev_preorder
    }

    /// Returns an iterator over the node indices in preorder (parents before children).
    ///
    /// # Example
    /// ```
    /// use phylik::model::Tree;
    ///
    /// let tree = Tree::from_newick("((Kiwi:1,Weka:1):0.5,Kea:1.5);").unwrap();
    /// let root = tree.root().unwrap();
    /// assert_eq!(tree.preorder_iter().next(), Some(root));
    /// assert_eq!(tree.preorder_iter().count(), 5);
    /// ```
    pub fn preorder_iter(&self) -> PreorderIter<'_> {
        PreorderIter { tree: self, next: self.preorder_first() }
    }

    /// Returns an iterator over the node indices in postorder (children before parents).
    pub fn postorder_iter(&self) -> PostorderIter<'_> {
        PostorderIter { tree: self, next: self.postorder_first() }
    }
}

/// Iterator following the preorder threads.
pub struct PreorderIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for PreorderIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.preorder_next(current);
        Some(current)
    }
}

/// Iterator following the preorder threads backwards.
pub struct PostorderIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for PostorderIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.postorder_next(current);
        Some(current)
    }
}

/// Iterator over the children of a node, left to right.
pub struct ChildIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.nodes[current].right_sib;
        Some(current)
    }
}
