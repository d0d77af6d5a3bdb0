use crate::data::ambiguity::StateCode;

/// Errors in observed data or its relation to a tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("no sequences or no sites")]
    Empty,

    #[error("taxon '{0}' appears more than once")]
    DuplicateTaxon(String),

    #[error("row of taxon '{taxon}' has {found} entries, expected {expected}")]
    RaggedRow { taxon: String, expected: usize, found: usize },

    #[error("unknown symbol '{symbol}' for taxon '{taxon}' at site {site}")]
    UnknownSymbol { taxon: String, site: usize, symbol: char },

    #[error("unknown state code {code} for taxon '{taxon}'")]
    UnknownCode { taxon: String, code: StateCode },

    #[error("{rows} data rows for {taxa} taxa")]
    TaxonCountMismatch { taxa: usize, rows: usize },

    #[error("pattern counts must be non-negative and finite")]
    InvalidCount,

    #[error("tree taxon '{0}' has no data")]
    MissingTaxon(String),
}
