//! Configuration of likelihood evaluation, moves and chains.
//!
//! All structs have sensible defaults and consuming `with_*` builders.
//! Values are checked by [ChainConfig::validate] before a chain starts.

use crate::likelihood::{
    DEFAULT_MAX_VALUE, DEFAULT_TRIGGER_SENSITIVITY, NoUnderflowPolicy, PatternSpecificUnderflowPolicy,
    SimpleUnderflowPolicy, UnderflowPolicy,
};
use crate::mcmc::ChainError;

/// Default tuning parameter of the edge-length move.
pub const DEFAULT_EDGE_MOVE_LAMBDA: f64 = 1.0;

/// Default tuning parameter of the Larget-Simon move.
pub const DEFAULT_LARGET_SIMON_LAMBDA: f64 = 0.2;

/// Default tuning parameter of the whole-tree scaler.
pub const DEFAULT_TREE_SCALER_LAMBDA: f64 = 0.5;

/// Default smallest edge length a move may produce.
pub const DEFAULT_MIN_EDGE_LENGTH: f64 = 1e-10;

/// How conditional likelihoods are protected against underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderflowMode {
    /// No rescaling.
    None,
    /// One count-weighted correction per buffer.
    #[default]
    Aggregate,
    /// One correction per pattern per buffer, needed for per-site likelihoods.
    PerPattern,
}

// =#========================================================================#=
// LIKELIHOOD CONFIG
// =#========================================================================#=
/// Configuration of a [LikelihoodEvaluator](crate::likelihood::LikelihoodEvaluator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodConfig {
    pub underflow: UnderflowMode,
    /// Number of traversed edges after which a buffer is rescaled.
    pub trigger_sensitivity: usize,
    /// Value the largest entry of a pattern is scaled up to.
    pub max_value: f64,
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        LikelihoodConfig {
            underflow: UnderflowMode::default(),
            trigger_sensitivity: DEFAULT_TRIGGER_SENSITIVITY,
            max_value: DEFAULT_MAX_VALUE,
        }
    }
}

impl LikelihoodConfig {
    pub fn with_underflow(mut self, underflow: UnderflowMode) -> Self {
        self.underflow = underflow;
        self
    }

    pub fn with_trigger_sensitivity(mut self, trigger_sensitivity: usize) -> Self {
        self.trigger_sensitivity = trigger_sensitivity;
        self
    }

    pub fn with_max_value(mut self, max_value: f64) -> Self {
        self.max_value = max_value;
        self
    }

    /// # Errors
    /// Returns [ChainError::InvalidConfig] for a zero trigger or a
    /// non-positive rescale ceiling.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.trigger_sensitivity == 0 {
            return Err(ChainError::InvalidConfig("trigger sensitivity must be positive".to_string()));
        }
        if !(self.max_value > 0.0 && self.max_value.is_finite()) {
            return Err(ChainError::InvalidConfig(format!("rescale ceiling {} must be positive", self.max_value)));
        }
        Ok(())
    }

    /// Creates the underflow policy described by this configuration.
    ///
    /// # Panics
    /// Panics if the configuration is invalid, see [validate](Self::validate).
    pub fn build_policy(&self) -> Box<dyn UnderflowPolicy> {
        match self.underflow {
            UnderflowMode::None => Box::new(NoUnderflowPolicy),
            UnderflowMode::Aggregate => {
                Box::new(SimpleUnderflowPolicy::new(self.trigger_sensitivity, self.max_value))
            }
            UnderflowMode::PerPattern => {
                Box::new(PatternSpecificUnderflowPolicy::new(self.trigger_sensitivity, self.max_value))
            }
        }
    }
}

// =#========================================================================#=
// MOVE CONFIG
// =#========================================================================#=
/// Tuning of the tree moves and of the posterior they target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveConfig {
    pub edge_move_lambda: f64,
    pub larget_simon_lambda: f64,
    pub tree_scaler_lambda: f64,
    pub min_edge_length: f64,
    /// Power the posterior is raised to, in [0, 1].
    pub heating: f64,
}

impl Default for MoveConfig {
    fn default() -> Self {
        MoveConfig {
            edge_move_lambda: DEFAULT_EDGE_MOVE_LAMBDA,
            larget_simon_lambda: DEFAULT_LARGET_SIMON_LAMBDA,
            tree_scaler_lambda: DEFAULT_TREE_SCALER_LAMBDA,
            min_edge_length: DEFAULT_MIN_EDGE_LENGTH,
            heating: 1.0,
        }
    }
}

impl MoveConfig {
    pub fn with_edge_move_lambda(mut self, lambda: f64) -> Self {
        self.edge_move_lambda = lambda;
        self
    }

    pub fn with_larget_simon_lambda(mut self, lambda: f64) -> Self {
        self.larget_simon_lambda = lambda;
        self
    }

    pub fn with_tree_scaler_lambda(mut self, lambda: f64) -> Self {
        self.tree_scaler_lambda = lambda;
        self
    }

    pub fn with_min_edge_length(mut self, min_edge_length: f64) -> Self {
        self.min_edge_length = min_edge_length;
        self
    }

    pub fn with_heating(mut self, heating: f64) -> Self {
        self.heating = heating;
        self
    }

    /// # Errors
    /// Returns [ChainError::InvalidConfig] for non-positive tuning parameters
    /// or edge floor, or a heating power outside [0, 1].
    pub fn validate(&self) -> Result<(), ChainError> {
        for (name, lambda) in [
            ("edge move", self.edge_move_lambda),
            ("Larget-Simon", self.larget_simon_lambda),
            ("tree scaler", self.tree_scaler_lambda),
        ] {
            if !(lambda > 0.0 && lambda.is_finite()) {
                return Err(ChainError::InvalidConfig(format!("{name} lambda {lambda} must be positive")));
            }
        }
        if !(self.min_edge_length > 0.0 && self.min_edge_length.is_finite()) {
            return Err(ChainError::InvalidConfig(format!(
                "minimum edge length {} must be positive",
                self.min_edge_length
            )));
        }
        if !(0.0..=1.0).contains(&self.heating) {
            return Err(ChainError::InvalidConfig(format!("heating power {} not in [0, 1]", self.heating)));
        }
        Ok(())
    }
}

// =#========================================================================#=
// CHAIN CONFIG
// =#========================================================================#=
/// Configuration of a [Chain](crate::mcmc::Chain).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainConfig {
    /// Number of cycles; each cycle updates every move once.
    pub num_cycles: usize,
    pub seed: u64,
    /// Log progress every this many cycles; zero disables progress reports.
    pub report_interval: usize,
    pub likelihood: LikelihoodConfig,
    pub moves: MoveConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            num_cycles: 1000,
            seed: 0,
            report_interval: 100,
            likelihood: LikelihoodConfig::default(),
            moves: MoveConfig::default(),
        }
    }
}

impl ChainConfig {
    pub fn with_num_cycles(mut self, num_cycles: usize) -> Self {
        self.num_cycles = num_cycles;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_report_interval(mut self, report_interval: usize) -> Self {
        self.report_interval = report_interval;
        self
    }

    pub fn with_likelihood(mut self, likelihood: LikelihoodConfig) -> Self {
        self.likelihood = likelihood;
        self
    }

    pub fn with_moves(mut self, moves: MoveConfig) -> Self {
        self.moves = moves;
        self
    }

    /// Checks the nested configurations.
    ///
    /// # Errors
    /// Returns the first [ChainError::InvalidConfig] found.
    pub fn validate(&self) -> Result<(), ChainError> {
        self.likelihood.validate()?;
        self.moves.validate()
    }
}
