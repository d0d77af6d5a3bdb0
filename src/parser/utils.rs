//! Label escaping for Newick output.
//!
//! Labels read by [ByteParser](crate::parser::ByteParser) are stored verbatim
//! (without quotes); [escape_label] turns them back into tokens the reader
//! accepts.

/// Characters that cannot appear in an unquoted Newick label.
const SPECIAL_CHARS: &[char] = &[',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\''];

/// Checks if a label is enclosed in single quotes.
///
/// # Examples
/// ```
/// # use phylik::parser::utils::is_single_quoted;
/// assert!(!is_single_quoted("Pukeko"));
/// assert!(is_single_quoted("'Swamp hen'"));
/// ```
pub fn is_single_quoted(label: &str) -> bool {
    label.len() >= 2 && label.starts_with('\'') && label.ends_with('\'')
}

/// Returns `true` if the label has to be quoted to survive a round trip.
pub fn needs_quoting(label: &str) -> bool {
    label.is_empty() || label.contains(SPECIAL_CHARS) || label.contains(' ')
}

/// Escapes a raw label for Newick output.
///
/// Labels containing special characters or spaces are wrapped in single
/// quotes, with internal single quotes doubled. Other labels are returned as-is.
///
/// # Examples
/// ```
/// # use phylik::parser::utils::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Australasian Swamphen"), "'Australasian Swamphen'");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if needs_quoting(label) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
