use crate::likelihood::LikelihoodError;
use crate::model::TreeError;

/// Errors when setting up or running a chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("tree has no leaf to root the chain at")]
    NoLeaf,

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Likelihood(#[from] LikelihoodError),
}
