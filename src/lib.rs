//! Phylik is a library to compute phylogenetic likelihoods incrementally
//! and to sample trees with Metropolis-Hastings moves.
//!
//! Core functionality provided:
//! - Trees: threaded arena trees with polytomies, rerooting and the
//!   self-inverse surgery primitives local moves need. See [crate::model].
//! - Newick: parse trees from and write them to Newick strings.
//!   See [crate::newick].
//! - Data: compress aligned sequences into site patterns with counts,
//!   including IUPAC ambiguity codes. See [crate::data].
//! - Likelihood: conditional likelihood arrays for every directed edge,
//!   pooled buffers, underflow rescaling, and an evaluator that only
//!   recomputes what changed. See [crate::likelihood].
//! - MCMC: an edge-length move and the Larget-Simon local move, with
//!   revert by cache restore instead of recomputation. See [crate::mcmc].
//!
//! Limitations:
//! - Reference substitution models only (Jukes-Cantor and identity); other
//!   models can be plugged in through
//!   [SubstitutionModel](crate::substitution::SubstitutionModel)
//! - Single-threaded; one chain owns its tree and evaluator
//!
//! # Usage patterns
//! 1. Quick functions below parse a tree and compute its log-likelihood
//!    with default settings.
//! 2. Configure a [LikelihoodEvaluator](crate::likelihood::LikelihoodEvaluator)
//!    and a [Chain](crate::mcmc::Chain) through [crate::config] for full
//!    control over underflow handling and move tuning.
//!
//! ## Example
//! ```
//! use phylik::data::{AmbiguityTable, PatternData};
//! use phylik::substitution::JukesCantor;
//!
//! let tree = phylik::parse_newick_str("((Kiwi:0.1,Weka:0.2):0.05,Kea:0.3,Tui:0.2);")?;
//! let data = PatternData::from_sequences(
//!     &[("Kiwi", "ACGT"), ("Weka", "ACGT"), ("Kea", "ACTT"), ("Tui", "GCTT")],
//!     AmbiguityTable::dna(),
//! )?;
//! let ln_l = phylik::log_likelihood(&tree, data, JukesCantor::dna())?;
//! assert!(ln_l < 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod data;
pub mod likelihood;
pub mod mcmc;
pub mod model;
pub mod newick;
pub mod parser;
pub mod substitution;

use crate::config::LikelihoodConfig;
use crate::data::PatternData;
use crate::likelihood::{LikelihoodError, LikelihoodEvaluator};
use crate::model::Tree;
use crate::parser::ParsingError;
use crate::substitution::SubstitutionModel;

// ============================================================================
// Quick API
// ============================================================================
/// Parse a Newick string using default settings, returning a [Tree].
///
/// See [`newick::parse_str`] for full documentation of this convenience function.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<Tree, ParsingError> {
    newick::parse_str(newick)
}

/// Computes the log-likelihood of `tree` once, with default settings.
///
/// For repeated evaluations keep a [LikelihoodEvaluator] instead, which
/// reuses everything that did not change.
///
/// # Errors
/// See [LikelihoodEvaluator::compute_log_likelihood].
pub fn log_likelihood<M: SubstitutionModel + 'static>(
    tree: &Tree,
    data: PatternData,
    model: M,
) -> Result<f64, LikelihoodError> {
    let mut evaluator = LikelihoodEvaluator::new(Box::new(model), data, &LikelihoodConfig::default())?;
    let root = tree.root().ok_or(LikelihoodError::EmptyTree)?;
    evaluator.compute_log_likelihood(tree, root)
}
