//! A single Markov chain cycling through a set of moves.

use crate::config::ChainConfig;
use crate::likelihood::LikelihoodEvaluator;
use crate::mcmc::ChainError;
use crate::mcmc::edge_move::EdgeMove;
use crate::mcmc::larget_simon::LargetSimonMove;
use crate::mcmc::move_engine::{ChainState, Move};
use crate::mcmc::prior::Prior;
use crate::mcmc::tree_scaler::TreeScalerMove;
use crate::model::Tree;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

/// Acceptance counts of one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveStats {
    pub name: String,
    pub proposed: usize,
    pub accepted: usize,
}

impl MoveStats {
    /// Fraction of accepted proposals, zero if nothing was proposed.
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 { 0.0 } else { self.accepted as f64 / self.proposed as f64 }
    }
}

// =#========================================================================#=
// CHAIN
// =#========================================================================#=
/// Runs cycles of Metropolis-Hastings updates; each cycle updates every move
/// once and then samples the log-likelihood.
///
/// # Example
/// ```
/// use phylik::config::{ChainConfig, LikelihoodConfig};
/// use phylik::data::{AmbiguityTable, PatternData};
/// use phylik::likelihood::LikelihoodEvaluator;
/// use phylik::mcmc::{Chain, FlatPrior};
/// use phylik::model::Tree;
/// use phylik::substitution::JukesCantor;
///
/// let data = PatternData::from_sequences(
///     &[("Kiwi", "ACGTTA"), ("Weka", "ACGATA"), ("Kea", "ACTTTA"), ("Tui", "GCTTTA")],
///     AmbiguityTable::dna(),
/// ).unwrap();
/// let tree = Tree::from_newick("((Kiwi:0.1,Weka:0.2):0.1,(Kea:0.3,Tui:0.1):0.1);").unwrap();
/// let config = ChainConfig::default().with_num_cycles(20).with_seed(3);
/// let evaluator =
///     LikelihoodEvaluator::new(Box::new(JukesCantor::dna()), data, &config.likelihood).unwrap();
///
/// let mut chain = Chain::new(tree, evaluator, Box::new(FlatPrior), config).unwrap();
/// chain.run().unwrap();
/// assert_eq!(chain.samples().len(), 20);
/// ```
#[derive(Debug)]
pub struct Chain {
    state: ChainState,
    moves: Vec<Box<dyn Move>>,
    stats: Vec<MoveStats>,
    samples: Vec<f64>,
    config: ChainConfig,
    cycle: usize,
}

impl Chain {
    /// Creates a chain with one [EdgeMove], one [LargetSimonMove] and one
    /// [TreeScalerMove], tuned by `config.moves`, and a [StdRng] seeded with
    /// `config.seed`.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or the starting tree cannot be
    /// evaluated.
    pub fn new(
        tree: Tree,
        evaluator: LikelihoodEvaluator,
        prior: Box<dyn Prior>,
        config: ChainConfig,
    ) -> Result<Self, ChainError> {
        config.validate()?;
        let moves = config.moves;
        let state = ChainState::new(
            tree,
            evaluator,
            prior,
            Box::new(StdRng::seed_from_u64(config.seed)),
            moves.heating,
            moves.min_edge_length,
        )?;
        info!(
            seed = config.seed,
            ln_likelihood = state.ln_likelihood(),
            "chain initialized"
        );
        let chain = Chain { state, moves: Vec::new(), stats: Vec::new(), samples: Vec::new(), config, cycle: 0 };
        Ok(chain
            .with_move(Box::new(EdgeMove::new(moves.edge_move_lambda).with_min_edge_length(moves.min_edge_length)))
            .with_move(Box::new(
                LargetSimonMove::new(moves.larget_simon_lambda).with_min_edge_length(moves.min_edge_length),
            ))
            .with_move(Box::new(
                TreeScalerMove::new(moves.tree_scaler_lambda).with_min_edge_length(moves.min_edge_length),
            )))
    }

    /// Adds a move to every cycle.
    pub fn with_move(mut self, r#move: Box<dyn Move>) -> Self {
        self.stats.push(MoveStats { name: r#move.name().to_string(), proposed: 0, accepted: 0 });
        self.moves.push(r#move);
        self
    }

    /// Removes all moves, e.g. to install a custom selection.
    pub fn without_moves(mut self) -> Self {
        self.moves.clear();
        self.stats.clear();
        self
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChainState {
        &mut self.state
    }

    pub fn stats(&self) -> &[MoveStats] {
        &self.stats
    }

    /// Log-likelihood sampled at the end of each cycle.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of cycles run so far.
    pub fn cycles_done(&self) -> usize {
        self.cycle
    }

    /// Runs one cycle: updates every move once, then samples.
    ///
    /// # Errors
    /// Propagates the first failing update; the chain stays in its last
    /// accepted state.
    pub fn step(&mut self) -> Result<(), ChainError> {
        for (r#move, stats) in self.moves.iter_mut().zip(&mut self.stats) {
            let accepted = r#move.update(&mut self.state)?;
            stats.proposed += 1;
            if accepted {
                stats.accepted += 1;
            }
        }
        self.cycle += 1;
        self.samples.push(self.state.ln_likelihood());

        let interval = self.config.report_interval;
        if interval > 0 && self.cycle % interval == 0 {
            info!(
                cycle = self.cycle,
                ln_likelihood = self.state.ln_likelihood(),
                ln_prior = self.state.ln_prior(),
                "chain progress"
            );
        }
        Ok(())
    }

    /// Runs the configured number of cycles.
    ///
    /// # Errors
    /// Propagates the first failing update.
    pub fn run(&mut self) -> Result<(), ChainError> {
        for _ in 0..self.config.num_cycles {
            self.step()?;
        }
        for stats in &self.stats {
            info!(
                move_name = %stats.name,
                proposed = stats.proposed,
                accepted = stats.accepted,
                rate = stats.acceptance_rate(),
                "move summary"
            );
        }
        Ok(())
    }
}
