//! Constants for Newick parsing and writing.

/// Newick label delimiters: parentheses, comma, colon, semicolon, whitespace, comment start
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Length given to non-root edges that carry no length in the Newick string
pub const DEFAULT_EDGE_LENGTH: f64 = 0.1;

/// Extra buffer in Newick string length/capacity estimate
pub(crate) const BUFFER_CHARS: usize = 10;

/// Estimated characters per edge length (e.g. ":0.009529961339106089")
pub(crate) const EDGE_LENGTH_CHARS: usize = 20;
