//! Structs and logic to parse Newick strings into [Tree]s.

use crate::model::{ChildPosition, NodeId, TaxonTable, Tree};
use crate::newick::defs::{DEFAULT_EDGE_LENGTH, NEWICK_LABEL_DELIMITERS};
use crate::parser::byte_parser::ByteParser;
use crate::parser::parsing_error::ParsingError;
use std::collections::HashSet;
use tracing::trace;

// =#========================================================================#=
// NEWICK PARSER
// =#========================================================================#=
/// Parser (configuration) for Newick strings with arbitrary branching.
///
/// # Configuration
/// * [`with_taxa(taxa)`](Self::with_taxa)
///     - Resolves leaf labels against a fixed [TaxonTable] (e.g. the one of
///       the pattern data), failing on unknown labels. Otherwise labels are
///       registered in a fresh table in order of appearance.
/// * [`with_default_edge_length(length)`](Self::with_default_edge_length)
///     - Length for non-root edges without one (default
///       [DEFAULT_EDGE_LENGTH]).
/// * [`without_default_edge_length()`](Self::without_default_edge_length)
///     - Leave missing lengths unset instead.
/// * [`with_reroot_at_first_leaf()`](Self::with_reroot_at_first_leaf)
///     - Reroot the parsed tree at its first leaf in preorder, as the move
///       engine requires a tip as structural root.
///
/// Internal node labels and root edge lengths are accepted and ignored.
///
/// # Example
/// ```
/// use phylik::newick::NewickParser;
/// use phylik::parser::ByteParser;
///
/// let mut parser = NewickParser::new().with_default_edge_length(0.5);
/// let mut bytes = ByteParser::for_str("((Kiwi,Weka)Ratites:1.0,Kea,Kaka);");
/// let tree = parser.parse_str(&mut bytes).unwrap();
/// assert_eq!(tree.num_tips(), 4);
/// assert_eq!(tree.total_edge_length(), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct NewickParser {
    taxa: Option<TaxonTable>,
    default_edge_length: Option<f64>,
    reroot_at_first_leaf: bool,
}

// ============================================================================
// Construction & Configuration (pub)
// ============================================================================
impl NewickParser {
    /// Creates a new [NewickParser] with default settings.
    pub fn new() -> Self {
        Self {
            taxa: None,
            default_edge_length: Some(DEFAULT_EDGE_LENGTH),
            reroot_at_first_leaf: false,
        }
    }

    /// Resolves leaf labels against the given taxon table.
    pub fn with_taxa(mut self, taxa: TaxonTable) -> Self {
        self.taxa = Some(taxa);
        self
    }

    /// Sets the length given to non-root edges without explicit length.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn with_default_edge_length(mut self, length: f64) -> Self {
        assert!(length >= 0.0 && length.is_finite(), "Default edge length must be non-negative, got {length}");
        self.default_edge_length = Some(length);
        self
    }

    /// Leaves edges without explicit length unset.
    pub fn without_default_edge_length(mut self) -> Self {
        self.default_edge_length = None;
        self
    }

    /// Reroots each parsed tree at its first leaf.
    pub fn with_reroot_at_first_leaf(mut self) -> Self {
        self.reroot_at_first_leaf = true;
        self
    }
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// API Parsing (pub)
// ============================================================================
impl NewickParser {
    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// # Arguments
    /// * `parser` - The byte parser positioned at the start of a Newick tree string
    ///
    /// # Returns
    /// * `Ok(Tree)` - The parsed phylogenetic tree
    /// * `Err(ParsingError)` - If the Newick format is invalid, labels are
    ///   unknown or duplicated, or edge lengths are negative
    pub fn parse_str(&mut self, parser: &mut ByteParser) -> Result<Tree, ParsingError> {
        let taxa = self.taxa.clone().unwrap_or_default();
        let mut state = ParseState {
            tree: Tree::new(taxa),
            seen: HashSet::new(),
            fixed_taxa: self.taxa.is_some(),
            default_edge_length: self.default_edge_length,
        };

        parser.skip_comment_and_whitespace()?;
        let root = state.parse_vertex(parser, true)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            if parser.is_eof() {
                return Err(ParsingError::unexpected_eof(parser));
            }
            let next_char = parser.peek().map(char::from);
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {:?}", next_char),
            ));
        }

        let mut tree = state.tree;
        tree.set_root(root)?;
        if self.reroot_at_first_leaf {
            if let Some(leaf) = tree.first_leaf() {
                tree.reroot_at(leaf)?;
            }
        }
        trace!(tips = tree.num_tips(), nodes = tree.num_nodes(), "parsed newick tree");

        Ok(tree)
    }

    /// Parses all semicolon-terminated Newick trees until EOF.
    pub fn parse_all(&mut self, parser: &mut ByteParser) -> Result<Vec<Tree>, ParsingError> {
        let mut trees = Vec::new();
        loop {
            parser.skip_comment_and_whitespace()?;
            if parser.is_eof() {
                break;
            }
            trees.push(self.parse_str(parser)?);
        }
        Ok(trees)
    }
}

// ============================================================================
// Parsing
// ============================================================================
struct ParseState {
    tree: Tree,
    seen: HashSet<usize>,
    fixed_taxa: bool,
    default_edge_length: Option<f64>,
}

impl ParseState {
    /// Parses a vertex (internal vertex or leaf) and returns its index:
    /// - Expects parser at the first token (whitespace skipped)
    /// - Dispatches on `(` to the children list, otherwise reads a leaf label
    fn parse_vertex(&mut self, parser: &mut ByteParser, is_root: bool) -> Result<NodeId, ParsingError> {
        let node = if parser.peek_is(b'(') {
            let node = self.tree.create_node(None, None);
            self.parse_children(parser, node)?;
            // Internal labels are ignored
            parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
            node
        } else {
            self.parse_leaf(parser)?
        };

        let edge_length = self.parse_edge_length(parser)?;
        if !is_root {
            if let Some(length) = edge_length.or(self.default_edge_length) {
                self.tree.set_edge_length(node, length);
            }
        }

        Ok(node)
    }

    /// Parses `(child,child,...)` and attaches the children to `node` in order.
    fn parse_children(&mut self, parser: &mut ByteParser, node: NodeId) -> Result<(), ParsingError> {
        parser.next_byte(); // consume '('
        loop {
            parser.skip_comment_and_whitespace()?;
            let child = self.parse_vertex(parser, false)?;
            self.tree.attach_as_child(node, child, ChildPosition::Rightmost)?;

            parser.skip_comment_and_whitespace()?;
            match parser.next_byte() {
                Some(b',') => continue,
                Some(b')') => return Ok(()),
                None => return Err(ParsingError::unexpected_eof(parser)),
                Some(other) => {
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        format!("Expected ',' or ')' after child but found {:?}", char::from(other)),
                    ));
                }
            }
        }
    }

    /// Parses a leaf label and creates the tip for it.
    fn parse_leaf(&mut self, parser: &mut ByteParser) -> Result<NodeId, ParsingError> {
        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if label.is_empty() {
            if parser.is_eof() {
                return Err(ParsingError::unexpected_eof(parser));
            }
            return Err(ParsingError::invalid_newick_string(parser, "Empty leaf label".to_string()));
        }

        let taxon = if self.fixed_taxa {
            self.tree
                .taxa()
                .index_of(&label)
                .ok_or_else(|| ParsingError::unresolved_label(parser, label.clone()))?
        } else {
            self.tree.taxa_mut().get_or_insert(&label)
        };
        if !self.seen.insert(taxon) {
            return Err(ParsingError::duplicate_label(parser, label));
        }

        Ok(self.tree.create_node(None, Some(taxon)))
    }

    /// Parses optional edge length `[:number]`:
    /// - Skips comments/whitespace before and after `:`
    /// - Supports scientific notation (e.g., `1.5e-10`)
    fn parse_edge_length(&mut self, parser: &mut ByteParser) -> Result<Option<f64>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_comment_and_whitespace()?;

        let raw = parser.consume_while(|b| {
            b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E')
        });
        let text = String::from_utf8_lossy(raw).into_owned();
        match text.parse::<f64>() {
            Ok(value) if value >= 0.0 && value.is_finite() => Ok(Some(value)),
            _ => Err(ParsingError::invalid_edge_length(parser, text)),
        }
    }
}
