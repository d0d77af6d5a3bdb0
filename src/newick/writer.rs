//! Newick serialization of [Tree]s.

use crate::model::{NodeId, Tree};
use crate::newick::defs::{BUFFER_CHARS, EDGE_LENGTH_CHARS};
use crate::parser::utils::escape_label;
use std::io::{self, Write};

/// Returns the Newick representation of the tree with closing semicolon.
///
/// Children are written in sibling order. The root carries no edge length.
/// A tree rooted at a tip is written in its unrooted form: the root tip
/// becomes the first entry of its child's children list, carrying the
/// child's edge length, so reading the string back gives the same unrooted
/// tree.
///
/// # Example
/// ```
/// use phylik::model::Tree;
///
/// let tree = Tree::from_newick("((Kiwi:1,Weka:2):0.5,Kea:1.5,Kaka:1);").unwrap();
/// assert_eq!(tree.to_newick(), "((Kiwi:1,Weka:2):0.5,Kea:1.5,Kaka:1);");
/// ```
pub fn to_newick(tree: &Tree) -> String {
    let mut newick = String::with_capacity(estimate_newick_len(tree));
    let Some(root) = tree.root() else {
        newick.push(';');
        return newick;
    };

    match tree.left_child(root) {
        Some(child) if tree.is_tip(root) => {
            // Tip root: write the unrooted view around its only child
            newick.push('(');
            push_label(tree, &mut newick, root);
            push_edge_length(&mut newick, tree.edge_length(child));
            if tree.left_child(child).is_none() {
                newick.push(',');
                push_label(tree, &mut newick, child);
                push_edge_length(&mut newick, Some(0.0));
            }
            for grandchild in tree.children(child) {
                newick.push(',');
                build_newick(tree, &mut newick, grandchild);
            }
            newick.push(')');
        }
        _ => build_newick(tree, &mut newick, root),
    }

    newick.push(';');
    newick
}

/// Writes the given trees to `writer` in Newick format, one tree per line.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick<W: Write>(writer: &mut W, trees: &[Tree]) -> io::Result<()> {
    for tree in trees {
        writer.write_all(to_newick(tree).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

// Recursive helper for building the Newick string
fn build_newick(tree: &Tree, newick: &mut String, node: NodeId) {
    if tree.left_child(node).is_some() {
        newick.push('(');
        for (i, child) in tree.children(node).enumerate() {
            if i > 0 {
                newick.push(',');
            }
            build_newick(tree, newick, child);
        }
        newick.push(')');
    } else {
        push_label(tree, newick, node);
    }
    push_edge_length(newick, tree.edge_length(node));
}

fn push_label(tree: &Tree, newick: &mut String, node: NodeId) {
    if let Some(name) = tree.taxon(node).and_then(|taxon| tree.taxa().name(taxon)) {
        newick.push_str(&escape_label(name));
    }
}

fn push_edge_length(newick: &mut String, edge_length: Option<f64>) {
    if let Some(length) = edge_length {
        newick.push(':');
        newick.push_str(&length.to_string());
    }
}

/// Estimates the length of the Newick string to pre-allocate capacity.
fn estimate_newick_len(tree: &Tree) -> usize {
    // "(,)" per internal node
    const INTERNAL_NODE_CHARS: usize = 3;

    let label_capacity: usize = tree.taxa().names().iter().map(|s| escape_label(s).len()).sum();
    tree.num_internals() * INTERNAL_NODE_CHARS
        + label_capacity
        + tree.num_nodes() * EDGE_LENGTH_CHARS
        + BUFFER_CHARS
}
