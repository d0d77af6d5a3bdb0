use crate::model::NodeId;

/// Errors when a tree cannot be evaluated against the data and model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LikelihoodError {
    #[error("node {0} is not part of the tree")]
    UnknownNode(NodeId),

    #[error("tree has no edge to evaluate")]
    EmptyTree,

    #[error("edge above node {0} has no length")]
    MissingEdgeLength(NodeId),

    #[error("tip {0} carries no taxon")]
    TipWithoutData(NodeId),

    #[error("taxon '{0}' has no data")]
    UnknownTaxon(String),

    #[error("model has {model} states but data has {data}")]
    StateCountMismatch { model: usize, data: usize },

    #[error("per-site log-likelihoods need per-pattern underflow correction")]
    SiteLikelihoodsUnavailable,
}
