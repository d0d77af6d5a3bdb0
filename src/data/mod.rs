//! Observed data the likelihood is computed from.
//!
//! - [PatternData]: per-tip state codes for each unique site pattern, plus
//!   pattern counts
//! - [AmbiguityTable]: which primary states each code stands for

pub mod ambiguity;
pub mod data_error;
pub mod pattern_data;

pub use ambiguity::{AmbiguityTable, StateCode};
pub use data_error::DataError;
pub use pattern_data::PatternData;
