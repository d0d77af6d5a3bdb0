//! Taxon table shared by trees and pattern data.
//!
//! - [TaxonTable]: Joined storage and lookup of taxon names, so that a tree
//!   and the data it is evaluated against agree on taxon indices.

use std::collections::HashMap;
use std::fmt;

/// Index of a taxon in a [TaxonTable].
pub type TaxonIndex = usize;

// =#========================================================================#=
// TAXON TABLE
// =#========================================================================#=
/// Maps taxon names to compact indices.
///
/// A tree stores only the [TaxonIndex] at its tips; the table is carried next
/// to the tree (never referenced from nodes) and handed to the data
/// collaborator, so both sides resolve names identically.
/// Names are deduplicated: inserting the same name twice returns the same index.
///
/// # Example
/// ```
/// use phylik::model::TaxonTable;
///
/// let mut taxa = TaxonTable::new();
/// let kea = taxa.get_or_insert("Kea");
/// let kaka = taxa.get_or_insert("Kaka");
/// assert_eq!(taxa.get_or_insert("Kea"), kea);
/// assert_ne!(kea, kaka);
/// assert_eq!(taxa.name(kaka), Some("Kaka"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonTable {
    names: Vec<String>,
    map: HashMap<String, TaxonIndex>,
}

impl TaxonTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from a list of names, in order.
    ///
    /// Duplicate names are collapsed onto their first index.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut table = Self::new();
        for name in names {
            table.get_or_insert(name.as_ref());
        }
        table
    }

    /// Gets the index for a name, inserting it if it doesn't exist.
    pub fn get_or_insert(&mut self, name: &str) -> TaxonIndex {
        if let Some(&index) = self.map.get(name) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.map.insert(name.to_string(), index);
        index
    }

    /// Retrieves the index for a given name.
    pub fn index_of(&self, name: &str) -> Option<TaxonIndex> {
        self.map.get(name).copied()
    }

    /// Retrieves the name for a given index.
    pub fn name(&self, index: TaxonIndex) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    /// Checks if a name exists in the table.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Returns the number of taxa.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Display for TaxonTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "TaxonTable ({} taxa):", self.names.len())?;
        for (index, name) in self.names.iter().enumerate() {
            writeln!(f, "  [{}] {}", index, name)?;
        }
        Ok(())
    }
}

impl std::ops::Index<TaxonIndex> for TaxonTable {
    type Output = str;

    fn index(&self, index: TaxonIndex) -> &Self::Output {
        &self.names[index]
    }
}
