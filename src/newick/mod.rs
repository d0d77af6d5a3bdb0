//! Newick format parser and writer for phylogenetic trees.
//!
//! This module provides [NewickParser] to parse Newick strings into
//! [Tree]s, and [to_newick] to write them back.
//!
//! # Quick API
//! * [`parse_str`] - parses a single string with default settings
//!
//! # Format
//! The supported grammar:
//! * `tree ::= vertex ';'`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex {',' vertex} ')' [label] [edge_length]`
//! * `leaf ::= label [edge_length]`
//! * `edge_length ::= ':' number`
//!
//! Furthermore:
//! * Internal vertices may have any number of children (polytomies)
//! * Whitespace can occur between elements,
//!   just not within an unquoted label or an edge length
//! * Comments are square brackets and can occur anywhere whitespace can
//! * Labels of internal vertices and the length of the root edge are ignored

mod defs;
pub mod parser;
pub mod writer;

pub use defs::DEFAULT_EDGE_LENGTH;
pub use parser::NewickParser;
pub use writer::{to_newick, write_newick};

use crate::model::Tree;
use crate::parser::ParsingError;
use crate::parser::byte_parser::ByteParser;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single Newick string to obtain a [Tree].
///
/// Leaf labels are registered in a fresh [TaxonTable](crate::model::TaxonTable)
/// in order of appearance; edges without length get [DEFAULT_EDGE_LENGTH].
///
/// # Arguments
/// * `newick` - The Newick format string to parse
///
/// # Returns
/// * [Tree] - Tree parsed from the string
/// * [ParsingError] - If the string is not valid Newick format
///
/// # Example
/// ```
/// use phylik::newick::parse_str;
///
/// let tree = parse_str("(Fratercula_cirrhata,(Fratercula_arctica,Fratercula_corniculata));")?;
/// assert_eq!(tree.num_tips(), 3);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<Tree, ParsingError> {
    let mut newick_parser = NewickParser::new();
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    newick_parser.parse_str(&mut byte_parser)
}
