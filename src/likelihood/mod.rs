//! Conditional likelihood machinery and the incremental evaluator.
//!
//! - [ClaBuffer]s are handed out by a [BufferPool] and stored in the
//!   [ClaSlot]s of each node's [PerNodeLikelihoodState]
//! - an [UnderflowPolicy] rescales buffers after each combination
//! - the [LikelihoodEvaluator] recomputes only stale CLAs and supports
//!   revert of proposals without recomputation

pub mod buffer_pool;
pub mod cla;
mod combine;
pub mod error;
pub mod evaluator;
pub mod node_state;
pub mod underflow;

pub use buffer_pool::BufferPool;
pub use cla::{ClaBuffer, ClaDims};
pub use error::LikelihoodError;
pub use evaluator::LikelihoodEvaluator;
pub use node_state::{ClaSlot, PerNodeLikelihoodState, SlotKind, SlotState};
pub use underflow::{
    DEFAULT_MAX_VALUE, DEFAULT_TRIGGER_SENSITIVITY, NoUnderflowPolicy, PatternSpecificUnderflowPolicy,
    SimpleUnderflowPolicy, UnderflowPolicy,
};
