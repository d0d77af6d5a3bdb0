//! Low-level byte-by-byte parser for ASCII text.
//!
//! This module provides [ByteParser], a cursor over an in-memory byte slice
//! with support for peeking, consuming, comment skipping and quote-aware
//! label parsing. Used as the foundation of the Newick reader.

use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte cursor over ASCII text.
///
/// # Features
/// - Case-insensitive matching for ASCII characters
/// - Whitespace and `[...]` comment skipping
/// - Quote-aware label parsing (single quotes with escaping)
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use phylik::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  [comment] (Kea:1.0,Kaka:1.0);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",:);").unwrap(), "Kea");
/// assert_eq!(parser.peek(), Some(b':'));
/// ```
pub struct ByteParser<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> ByteParser<'a> {
    /// Creates a new `ByteParser` over a byte slice.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Creates a new `ByteParser` over a string.
    pub fn for_str(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    /// Gets the current byte and advances the position (consumes it).
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    /// Skips (consumes) all consecutive whitespace characters.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    /// Skips (consumes) a comment in square brackets `[...]` if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// Returns an error if a comment starts with `[` but doesn't have a closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        if !self.consume_until(b']') {
            return Err(ParsingError::unclosed_comment(self));
        }
        Ok(true)
    }

    /// Skips (consumes) all consecutive whitespace and comments.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    /// Checks if the current byte matches the target byte (case-insensitive for ASCII).
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek().is_some_and(|b| b.eq_ignore_ascii_case(&ch))
    }

    /// Consumes the current byte if it matches the target byte (case-insensitive).
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes bytes up to and including the target byte.
    ///
    /// # Returns
    /// `true` if the target was found, `false` if EOF was reached first
    pub fn consume_until(&mut self, target: u8) -> bool {
        while let Some(b) = self.next_byte() {
            if b == target {
                return true;
            }
        }
        false
    }

    /// Consumes bytes as long as `predicate` holds and returns them.
    pub fn consume_while<F: Fn(u8) -> bool>(&mut self, predicate: F) -> &'a [u8] {
        let start = self.position;
        while self.peek().is_some_and(&predicate) {
            self.position += 1;
        }
        &self.input[start..self.position]
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&self, k: usize) -> String {
        let start = self.position.min(self.input.len());
        let end = (start + k).min(self.input.len());
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set.
    ///
    /// # Arguments
    /// * `delimiters` - Byte array of characters that end an unquoted label
    ///
    /// # Errors
    /// Returns an error if a quoted label is not closed, or on unclosed comments
    /// before the label.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a quoted label enclosed in single quotes.
    ///
    /// Assumes the opening quote has not been consumed yet. Single quotes within
    /// the label are escaped by doubling them (e.g., `'Baillon''s'` becomes `Baillon's`).
    ///
    /// # Errors
    /// Returns an error if the quoted label is not properly closed
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        let start = self.position;
        self.position += 1; // opening '

        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                None => {
                    self.position = start;
                    return Err(ParsingError::unclosed_quote(self));
                }
                Some(b'\'') if self.peek() == Some(b'\'') => {
                    label.push(b'\'');
                    self.position += 1;
                }
                Some(b'\'') => break,
                Some(b) => label.push(b),
            }
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an unquoted label until any of the given delimiters is encountered.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let label = self.consume_while(|b| !delimiters.contains(&b));
        String::from_utf8_lossy(label).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_label_with_escaped_quote() {
        let mut parser = ByteParser::for_str("'Baillon''s Crake':0.5");
        assert_eq!(parser.parse_label(b":,);").unwrap(), "Baillon's Crake");
        assert_eq!(parser.peek(), Some(b':'));
    }

    #[test]
    fn test_unclosed_quote() {
        let mut parser = ByteParser::for_str("'Takahe");
        assert!(parser.parse_label(b":,);").is_err());
    }

    #[test]
    fn test_unclosed_comment() {
        let mut parser = ByteParser::for_str("  [Pukeko ");
        assert!(parser.skip_comment_and_whitespace().is_err());
    }

    #[test]
    fn test_consume_while_and_eof() {
        let mut parser = ByteParser::for_str("0.25)");
        assert_eq!(parser.consume_while(|b| b.is_ascii_digit() || b == b'.'), b"0.25");
        assert!(parser.consume_if(b')'));
        assert!(parser.is_eof());
        assert_eq!(parser.next_byte(), None);
    }
}
