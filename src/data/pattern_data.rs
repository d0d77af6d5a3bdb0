//! Compressed site-pattern data.

use crate::data::ambiguity::{AmbiguityTable, StateCode};
use crate::data::data_error::DataError;
use crate::model::{TaxonIndex, TaxonTable};
use std::collections::HashMap;
use tracing::debug;

// =#========================================================================#=
// PATTERN DATA
// =#========================================================================#=
/// Observed data as unique site patterns with counts.
///
/// For each taxon a vector of [StateCode]s holds one entry per unique
/// pattern; `pattern_counts` says how many alignment columns each pattern
/// stands for (fractional counts are allowed, e.g. for bootstrap weights).
/// Taxon indices refer to the carried [TaxonTable].
#[derive(Debug, Clone, PartialEq)]
pub struct PatternData {
    taxa: TaxonTable,
    ambiguity: AmbiguityTable,
    tip_codes: Vec<Vec<StateCode>>,
    pattern_counts: Vec<f64>,
}

impl PatternData {
    /// Creates pattern data from already compressed patterns.
    ///
    /// # Arguments
    /// * `taxa` - Taxon table; `tip_codes[i]` belongs to taxon `i`
    /// * `ambiguity` - Table the codes refer to
    /// * `tip_codes` - Per taxon, one code per pattern
    /// * `pattern_counts` - Weight of each pattern
    ///
    /// # Errors
    /// Fails if the number of code vectors differs from the number of taxa,
    /// a code vector has the wrong length, a code is not in the table, or a
    /// count is negative.
    pub fn new(
        taxa: TaxonTable,
        ambiguity: AmbiguityTable,
        tip_codes: Vec<Vec<StateCode>>,
        pattern_counts: Vec<f64>,
    ) -> Result<Self, DataError> {
        if tip_codes.len() != taxa.len() {
            return Err(DataError::TaxonCountMismatch { taxa: taxa.len(), rows: tip_codes.len() });
        }
        if pattern_counts.is_empty() {
            return Err(DataError::Empty);
        }
        let num_patterns = pattern_counts.len();
        for (taxon, codes) in tip_codes.iter().enumerate() {
            if codes.len() != num_patterns {
                return Err(DataError::RaggedRow {
                    taxon: taxa[taxon].to_string(),
                    expected: num_patterns,
                    found: codes.len(),
                });
            }
            if let Some(&code) = codes.iter().find(|&&c| c as usize >= ambiguity.num_codes()) {
                return Err(DataError::UnknownCode { taxon: taxa[taxon].to_string(), code });
            }
        }
        if pattern_counts.iter().any(|&c| !(c >= 0.0 && c.is_finite())) {
            return Err(DataError::InvalidCount);
        }

        Ok(PatternData { taxa, ambiguity, tip_codes, pattern_counts })
    }

    /// Builds pattern data from aligned sequences, compressing identical
    /// columns into one pattern. Patterns are kept in order of first
    /// occurrence.
    ///
    /// # Errors
    /// Fails on an empty alignment, duplicate taxon names, sequences of
    /// different lengths, or symbols the ambiguity table does not know.
    ///
    /// # Example
    /// ```
    /// use phylik::data::{AmbiguityTable, PatternData};
    ///
    /// let data = PatternData::from_sequences(
    ///     &[("Kea", "ACGA"), ("Kaka", "ACGA"), ("Kakapo", "ACTA")],
    ///     AmbiguityTable::dna(),
    /// ).unwrap();
    /// assert_eq!(data.num_patterns(), 3); // columns 1 and 4 are identical
    /// assert_eq!(data.pattern_counts(), &[2.0, 1.0, 1.0]);
    /// ```
    pub fn from_sequences<N: AsRef<str>, S: AsRef<str>>(
        sequences: &[(N, S)],
        ambiguity: AmbiguityTable,
    ) -> Result<Self, DataError> {
        if sequences.is_empty() {
            return Err(DataError::Empty);
        }

        let mut taxa = TaxonTable::new();
        let mut rows: Vec<Vec<StateCode>> = Vec::with_capacity(sequences.len());
        for (name, sequence) in sequences {
            let name = name.as_ref();
            if taxa.contains(name) {
                return Err(DataError::DuplicateTaxon(name.to_string()));
            }
            taxa.get_or_insert(name);

            let row = sequence
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .enumerate()
                .map(|(site, symbol)| {
                    ambiguity.code_for(symbol).ok_or_else(|| DataError::UnknownSymbol {
                        taxon: name.to_string(),
                        site,
                        symbol,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let num_sites = rows[0].len();
        if num_sites == 0 {
            return Err(DataError::Empty);
        }
        if let Some((taxon, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_sites) {
            return Err(DataError::RaggedRow {
                taxon: taxa[taxon].to_string(),
                expected: num_sites,
                found: row.len(),
            });
        }

        // Compress columns
        let mut index_of: HashMap<Vec<StateCode>, usize> = HashMap::new();
        let mut tip_codes: Vec<Vec<StateCode>> = vec![Vec::new(); rows.len()];
        let mut pattern_counts = Vec::new();
        for site in 0..num_sites {
            let column: Vec<StateCode> = rows.iter().map(|row| row[site]).collect();
            match index_of.get(&column) {
                Some(&pattern) => pattern_counts[pattern] += 1.0,
                None => {
                    index_of.insert(column.clone(), pattern_counts.len());
                    pattern_counts.push(1.0);
                    for (codes, code) in tip_codes.iter_mut().zip(column) {
                        codes.push(code);
                    }
                }
            }
        }
        debug!(taxa = taxa.len(), sites = num_sites, patterns = pattern_counts.len(), "compressed alignment");

        Ok(PatternData { taxa, ambiguity, tip_codes, pattern_counts })
    }

    /// Returns the taxon table.
    pub fn taxa(&self) -> &TaxonTable {
        &self.taxa
    }

    /// Returns the ambiguity table.
    pub fn ambiguity(&self) -> &AmbiguityTable {
        &self.ambiguity
    }

    /// Returns the number of primary states.
    pub fn num_states(&self) -> usize {
        self.ambiguity.num_states()
    }

    /// Returns the number of unique patterns.
    pub fn num_patterns(&self) -> usize {
        self.pattern_counts.len()
    }

    /// Returns the number of taxa.
    pub fn num_taxa(&self) -> usize {
        self.taxa.len()
    }

    /// Returns the total weight of all patterns.
    pub fn num_sites(&self) -> f64 {
        self.pattern_counts.iter().sum()
    }

    /// Returns the weight of each pattern.
    pub fn pattern_counts(&self) -> &[f64] {
        &self.pattern_counts
    }

    /// Returns the codes observed for `taxon`, one per pattern.
    ///
    /// # Panics
    /// Panics if `taxon` is out of range.
    pub fn tip_codes(&self, taxon: TaxonIndex) -> &[StateCode] {
        &self.tip_codes[taxon]
    }
}
