//! Error types for Newick parsing.
//!
//! This module provides [ParsingError] and [ParsingErrorKind] for representing
//! and reporting errors that occur while reading tree descriptions.

use crate::model::TreeError;
use crate::parser::byte_parser::ByteParser;

/// Default length of context provided by error from parser
const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// PARSING ERROR KIND
// =#========================================================================#=
/// Error kinds that can occur while parsing a tree description.
#[derive(PartialEq, Debug, Clone, thiserror::Error)]
pub enum ParsingErrorKind {
    #[error("Unexpected end of input")]
    UnexpectedEOF,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Unclosed quoted label")]
    UnclosedQuote,
    #[error("Invalid newick string: {0}")]
    InvalidNewickString(String),
    #[error("Invalid edge length '{0}'")]
    InvalidEdgeLength(String),
    #[error("Duplicate leaf label '{0}'")]
    DuplicateLabel(String),
    #[error("Unknown taxon '{0}'")]
    UnresolvedLabel(String),
    #[error("Invalid tree structure - {0}")]
    InvalidTreeStructure(#[source] TreeError),
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================#=
/// Parsing error with contextual information (position and surrounding bytes).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at position {position}{}", context_suffix(.context))]
pub struct ParsingError {
    #[source]
    kind: ParsingErrorKind,
    position: usize,
    context: String,
}

impl ParsingError {
    /// Create a ParsingError from an error kind and parser state
    pub fn from_parser(kind: ParsingErrorKind, parser: &ByteParser) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Convenience constructor for UnexpectedEOF
    pub fn unexpected_eof(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorKind::UnexpectedEOF, parser)
    }

    /// Convenience constructor for UnclosedComment
    pub fn unclosed_comment(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorKind::UnclosedComment, parser)
    }

    /// Convenience constructor for UnclosedQuote
    pub fn unclosed_quote(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorKind::UnclosedQuote, parser)
    }

    /// Convenience constructor for InvalidNewickString
    pub fn invalid_newick_string(parser: &ByteParser, msg: String) -> Self {
        Self::from_parser(ParsingErrorKind::InvalidNewickString(msg), parser)
    }

    /// Convenience constructor for InvalidEdgeLength
    pub fn invalid_edge_length(parser: &ByteParser, value: String) -> Self {
        Self::from_parser(ParsingErrorKind::InvalidEdgeLength(value), parser)
    }

    /// Convenience constructor for DuplicateLabel
    pub fn duplicate_label(parser: &ByteParser, label: String) -> Self {
        Self::from_parser(ParsingErrorKind::DuplicateLabel(label), parser)
    }

    /// Convenience constructor for UnresolvedLabel
    pub fn unresolved_label(parser: &ByteParser, label: String) -> Self {
        Self::from_parser(ParsingErrorKind::UnresolvedLabel(label), parser)
    }

    /// Create a ParsingError without parser context (for structural errors)
    pub fn without_context(kind: ParsingErrorKind) -> Self {
        Self { kind, position: 0, context: String::new() }
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorKind {
        &self.kind
    }

    /// Get the position where the error occurred
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Context line appended to the message, empty without context.
fn context_suffix(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n  Context (next {} bytes): {}", context.len(), context)
    }
}

impl From<TreeError> for ParsingError {
    fn from(err: TreeError) -> Self {
        ParsingError::without_context(ParsingErrorKind::InvalidTreeStructure(err))
    }
}
