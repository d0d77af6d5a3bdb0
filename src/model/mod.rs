//! Data model for threaded phylogenetic trees.
//!
//! # Tree representation
//! Trees are represented by [Tree], which uses the arena pattern to store
//! [Node]s referenced by [NodeId]. Children form sibling lists, so nodes may
//! have any number of children (polytomies). Preorder threads linearize the
//! tree; every structural operation keeps them consistent.
//!
//! # Taxa
//! A [TaxonTable] is carried by the tree value; tips only store a
//! [TaxonIndex]. The same table is used to line up tips with pattern data.
//!
//! # Structural operations
//! - [`Tree::attach_as_child`] and [`Tree::detach`] move whole subtrees
//! - [`Tree::reroot_at`] moves the structural root onto a leaf
//! - [`Tree::swap_nodes`] and [`Tree::swap_across_polytomy`] (see [surgery])
//!   are the self-inverse primitives used by topology moves
//!
//! All of them validate their arguments before mutating and report
//! problems as [TreeError].

pub mod node;
pub mod surgery;
pub mod taxon_table;
pub mod tree;
pub mod tree_error;

pub use node::EdgeLength;
pub use node::Node;
pub use node::NodeId;
pub use taxon_table::TaxonIndex;
pub use taxon_table::TaxonTable;
pub use tree::ChildPosition;
pub use tree::Tree;
pub use tree_error::TreeError;
