use approx::assert_relative_eq;
use phylik::config::{ChainConfig, LikelihoodConfig, MoveConfig};
use phylik::data::{AmbiguityTable, PatternData};
use phylik::likelihood::LikelihoodEvaluator;
use phylik::mcmc::{
    Chain, ChainError, ChainState, EdgeMove, ExponentialEdgePrior, FlatPrior, LargetSimonMove, LocalSwap, Move,
    MoveStatus, TreeScalerMove,
};
use phylik::model::{TaxonTable, Tree};
use phylik::substitution::JukesCantor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const SEQUENCES: [(&str, &str); 7] = [
    ("Kiwi", "ACGTTAGCAATGCCGTA"),
    ("Weka", "ACGATAGCATTGCCGTA"),
    ("Kea", "ACTTTAGGAATGCAGTA"),
    ("Kaka", "ACTTTAGGAATGCAGTT"),
    ("Tui", "GCTTTACGAATCCAGTA"),
    ("Takahe", "GCTATACGTATCCAGAA"),
    ("Pukeko", "GCTATACGTATCCAGAN"),
];

const POLYTOMY_TREE: &str =
    "((Kiwi:0.1,Weka:0.2):0.05,(Kea:0.1,Kaka:0.1,Tui:0.3):0.1,(Takahe:0.05,Pukeko:0.06):0.2);";

fn data() -> PatternData {
    PatternData::from_sequences(&SEQUENCES, AmbiguityTable::dna()).unwrap()
}

fn evaluator() -> LikelihoodEvaluator {
    LikelihoodEvaluator::new(Box::new(JukesCantor::dna()), data(), &LikelihoodConfig::default()).unwrap()
}

fn chain_state(newick: &str, seed: u64) -> ChainState {
    ChainState::new(
        Tree::from_newick(newick).unwrap(),
        evaluator(),
        Box::new(ExponentialEdgePrior::default()),
        Box::new(StdRng::seed_from_u64(seed)),
        1.0,
        1e-10,
    )
    .unwrap()
}

/// Log-likelihood of the state's tree from scratch.
fn fresh_ln_likelihood(state: &ChainState) -> f64 {
    let tree = state.tree();
    evaluator().compute_log_likelihood(tree, tree.root().unwrap()).unwrap()
}

/// Proposes, evaluates the proposal and reverts it, checking that tree and
/// evaluator end up exactly as before.
fn assert_revert_restores(r#move: &mut dyn Move, state: &mut ChainState) {
    let newick = state.tree().to_newick();
    let slots = state.evaluator().slot_states();
    let outstanding = state.evaluator().pool().outstanding();
    let ln_l = state.compute_ln_likelihood().unwrap();

    r#move.propose_new_state(state);
    assert_eq!(r#move.status(), MoveStatus::Proposed);
    state.compute_ln_likelihood().unwrap();
    r#move.revert(state);

    assert_eq!(r#move.status(), MoveStatus::Reverted);
    assert_eq!(state.tree().to_newick(), newick);
    assert!(state.tree().check_threading());
    assert_eq!(state.evaluator().slot_states(), slots);
    assert_eq!(state.evaluator().pool().outstanding(), outstanding);
    assert!(!state.evaluator().is_proposal_active());
    assert_eq!(state.compute_ln_likelihood().unwrap(), ln_l);
    assert_eq!(state.evaluator().num_recomputed_last(), 0);
}

// --- TESTS CHAIN STATE ---
#[test]
fn test_state_is_tip_rooted_and_clamped() {
    let state = ChainState::new(
        Tree::from_newick("((Kiwi:0,Weka:0.2):0.1,Kea:0.3,Tui:0.1);").unwrap(),
        LikelihoodEvaluator::new(
            Box::new(JukesCantor::dna()),
            PatternData::from_sequences(
                &[("Kiwi", "ACGT"), ("Weka", "ACGA"), ("Kea", "ACTT"), ("Tui", "GCTT")],
                AmbiguityTable::dna(),
            )
            .unwrap(),
            &LikelihoodConfig::default(),
        )
        .unwrap(),
        Box::new(FlatPrior),
        Box::new(StdRng::seed_from_u64(1)),
        0.5,
        1e-6,
    )
    .unwrap();

    let tree = state.tree();
    let root = tree.root().unwrap();
    assert!(tree.is_tip(root));
    assert_eq!(tree.taxa().name(tree.taxon(root).unwrap()), Some("Kiwi"));
    let shortest = tree.preorder_iter().filter_map(|node| tree.edge_length(node)).fold(f64::INFINITY, f64::min);
    assert_eq!(shortest, 1e-6);
    assert!(state.ln_likelihood().is_finite());
    assert_eq!(state.ln_prior(), 0.0);
    assert_eq!(state.ln_posterior(), 0.5 * state.ln_likelihood());
}

#[test]
fn test_empty_tree_rejected() {
    let result = ChainState::new(
        Tree::new(TaxonTable::new()),
        evaluator(),
        Box::new(FlatPrior),
        Box::new(StdRng::seed_from_u64(1)),
        1.0,
        1e-10,
    );
    assert!(matches!(result, Err(ChainError::NoLeaf)));
}

// --- TESTS EDGE MOVE ---
#[test]
fn test_edge_move_revert_restores_everything() {
    for seed in 0..30 {
        let mut state = chain_state(POLYTOMY_TREE, seed);
        let mut r#move = EdgeMove::default();
        assert_revert_restores(&mut r#move, &mut state);
    }
}

#[test]
fn test_edge_move_hastings_is_symmetric() {
    let mut state = chain_state(POLYTOMY_TREE, 3);
    let mut r#move = EdgeMove::new(0.5);
    let kea = state.tree().find_tip(state.tree().taxa().index_of("Kea").unwrap()).unwrap();
    let before = state.tree().edge_length(kea).unwrap();

    r#move.propose_for(&mut state, kea, 2.0);
    assert_relative_eq!(r#move.ln_hastings_ratio(), 2.0_f64.ln(), max_relative = 1e-12);
    assert_relative_eq!(state.tree().edge_length(kea).unwrap(), 2.0 * before);
    r#move.accept(&mut state);

    r#move.propose_for(&mut state, kea, 0.5);
    assert_relative_eq!(r#move.ln_hastings_ratio(), -(2.0_f64.ln()), max_relative = 1e-12);
    r#move.revert(&mut state);
    assert_relative_eq!(state.tree().edge_length(kea).unwrap(), 2.0 * before);
}

#[test]
fn test_edge_move_respects_floor() {
    let mut state = chain_state(POLYTOMY_TREE, 5);
    let mut r#move = EdgeMove::new(0.5).with_min_edge_length(1e-3);
    let tui = state.tree().find_tip(state.tree().taxa().index_of("Tui").unwrap()).unwrap();
    r#move.propose_for(&mut state, tui, 1e-9);
    assert_eq!(state.tree().edge_length(tui), Some(1e-3));
    assert_eq!(r#move.node(), Some(tui));
    r#move.revert(&mut state);
    assert_eq!(state.tree().edge_length(tui), Some(0.3));
}

#[test]
fn test_edge_move_accept_matches_fresh_evaluation() {
    let mut state = chain_state(POLYTOMY_TREE, 11);
    let mut r#move = EdgeMove::new(2.0);
    for _ in 0..25 {
        r#move.propose_new_state(&mut state);
        state.compute_ln_likelihood().unwrap();
        r#move.accept(&mut state);
    }
    let ln_l = state.compute_ln_likelihood().unwrap();
    assert_relative_eq!(ln_l, fresh_ln_likelihood(&state), max_relative = 1e-10);
}

// --- TESTS LARGET SIMON MOVE ---
#[test]
fn test_local_move_revert_restores_everything() {
    let mut swaps = 0;
    for seed in 0..60 {
        let mut state = chain_state(POLYTOMY_TREE, seed);
        let mut r#move = LargetSimonMove::new(1.0);
        for _ in 0..3 {
            assert_revert_restores(&mut r#move, &mut state);
            if r#move.last_swap().is_some_and(|swap| swap != LocalSwap::None) {
                swaps += 1;
            }
        }
    }
    // Both topology changes and pure rescaling have been reverted
    assert!(swaps > 0);
    assert!(swaps < 180);
}

#[test]
fn test_local_move_accept_matches_fresh_evaluation() {
    let mut state = chain_state(POLYTOMY_TREE, 17);
    let mut r#move = LargetSimonMove::new(1.5);
    let num_tips = state.tree().num_tips();
    let total_children: usize =
        state.tree().preorder_iter().map(|node| state.tree().count_children(node)).sum();

    for round in 0..40 {
        r#move.propose_new_state(&mut state);
        let ln_l = state.compute_ln_likelihood().unwrap();
        assert!(r#move.ln_hastings_ratio().abs() <= 3.0 * 1.5 / 2.0 + 1e-12);
        if round % 3 == 0 {
            r#move.revert(&mut state);
        } else {
            r#move.accept(&mut state);
            assert_relative_eq!(ln_l, fresh_ln_likelihood(&state), max_relative = 1e-10);
        }
        let tree = state.tree();
        assert!(tree.check_threading());
        assert_eq!(tree.num_tips(), num_tips);
        assert_eq!(tree.preorder_iter().map(|node| tree.count_children(node)).sum::<usize>(), total_children);
    }
    assert!(r#move.num_topology_changes() > 0);
}

#[test]
fn test_local_move_on_star_tree() {
    let mut state = chain_state("(Kiwi:0.1,Weka:0.2,Kea:0.3,Tui:0.1,Takahe:0.2);", 23);
    let mut r#move = LargetSimonMove::new(0.8);
    for _ in 0..10 {
        let before = state.tree().total_edge_length();
        r#move.propose_new_state(&mut state);
        assert_eq!(r#move.last_swap(), None);
        assert!(r#move.ln_hastings_ratio().abs() <= 0.4 + 1e-12);
        assert_ne!(state.tree().total_edge_length(), before);
        state.compute_ln_likelihood().unwrap();
        r#move.revert(&mut state);
        assert_eq!(state.tree().total_edge_length(), before);
    }
}

#[test]
fn test_local_move_hastings_uses_clamped_lengths() {
    let mut clamped = 0;
    for seed in 0..20 {
        let mut state = chain_state(POLYTOMY_TREE, seed);
        // Every path is shorter than three times the floor
        let mut r#move = LargetSimonMove::new(0.2).with_min_edge_length(0.5);
        let before: Vec<Option<f64>> =
            (0..state.tree().arena_len()).map(|node| state.tree().edge_length(node)).collect();

        r#move.propose_new_state(&mut state);
        let segment = r#move.last_segment().unwrap();
        let m: f64 = segment.iter().map(|&node| before[node].unwrap()).sum();
        let applied: f64 = segment.iter().map(|&node| state.tree().edge_length(node).unwrap()).sum();
        assert!(segment.iter().all(|&node| state.tree().edge_length(node).unwrap() >= 0.5));
        assert_relative_eq!(r#move.ln_hastings_ratio(), 3.0 * (applied / m).ln(), max_relative = 1e-12);
        if r#move.ln_hastings_ratio() > 3.0 * 0.1 {
            clamped += 1;
        }
        state.compute_ln_likelihood().unwrap();
        r#move.revert(&mut state);
    }
    assert_eq!(clamped, 20);
}

#[test]
#[should_panic(expected = "pending proposal")]
fn test_double_proposal_panics() {
    let mut state = chain_state(POLYTOMY_TREE, 29);
    let mut r#move = LargetSimonMove::default();
    r#move.propose_new_state(&mut state);
    r#move.propose_new_state(&mut state);
}

#[test]
fn test_status_records_last_outcome() {
    let mut state = chain_state(POLYTOMY_TREE, 31);
    let mut r#move = EdgeMove::default();
    assert_eq!(r#move.status(), MoveStatus::Idle);

    r#move.propose_new_state(&mut state);
    assert!(r#move.status().is_pending());
    state.compute_ln_likelihood().unwrap();
    r#move.accept(&mut state);
    assert_eq!(r#move.status(), MoveStatus::Accepted);

    // A new proposal may follow either outcome
    r#move.propose_new_state(&mut state);
    state.compute_ln_likelihood().unwrap();
    r#move.revert(&mut state);
    assert_eq!(r#move.status(), MoveStatus::Reverted);
    assert!(!r#move.status().is_pending());
}

// --- TESTS TREE SCALER ---
#[test]
fn test_tree_scaler_revert_restores_everything() {
    for seed in 0..20 {
        let mut state = chain_state(POLYTOMY_TREE, seed);
        let mut r#move = TreeScalerMove::new(1.0);
        assert_revert_restores(&mut r#move, &mut state);
    }
}

#[test]
fn test_tree_scaler_hastings_and_jacobian() {
    let mut state = chain_state(POLYTOMY_TREE, 37);
    let num_edges = state.tree().num_edges() as f64;
    let total = state.tree().total_edge_length();
    let mut r#move = TreeScalerMove::new(0.5);

    r#move.propose_for(&mut state, 2.0);
    assert_relative_eq!(state.tree().total_edge_length(), 2.0 * total, max_relative = 1e-12);
    assert_relative_eq!(r#move.ln_hastings_ratio(), 2.0_f64.ln(), max_relative = 1e-12);
    assert_relative_eq!(r#move.ln_jacobian(), (num_edges - 1.0) * 2.0_f64.ln(), max_relative = 1e-12);
    let ln_l = state.compute_ln_likelihood().unwrap();
    r#move.accept(&mut state);
    assert_relative_eq!(ln_l, fresh_ln_likelihood(&state), max_relative = 1e-10);

    // The inverse proposal carries the opposite correction
    r#move.propose_for(&mut state, 0.5);
    let total_correction = r#move.ln_hastings_ratio() + r#move.ln_jacobian();
    assert_relative_eq!(total_correction, -num_edges * 2.0_f64.ln(), max_relative = 1e-12);
    state.compute_ln_likelihood().unwrap();
    r#move.revert(&mut state);
    assert_relative_eq!(state.tree().total_edge_length(), 2.0 * total, max_relative = 1e-12);
}

#[test]
fn test_tree_scaler_jacobian_follows_floor() {
    let mut state = chain_state(POLYTOMY_TREE, 41);
    let lengths: Vec<f64> = state.tree().preorder_iter().filter_map(|node| state.tree().edge_length(node)).collect();
    let mut r#move = TreeScalerMove::new(0.5).with_min_edge_length(0.01);

    r#move.propose_for(&mut state, 0.1);
    let expected: f64 = lengths.iter().map(|&length| ((length * 0.1).max(0.01) / length).ln()).sum::<f64>();
    assert_relative_eq!(r#move.ln_hastings_ratio() + r#move.ln_jacobian(), expected, max_relative = 1e-12);
    r#move.revert(&mut state);
}

// --- TESTS CHAIN ---
#[test]
fn test_chain_run() {
    let tree = Tree::from_newick(POLYTOMY_TREE).unwrap();
    let config = ChainConfig::default().with_num_cycles(60).with_seed(7).with_report_interval(20);
    let mut chain = Chain::new(tree, evaluator(), Box::new(ExponentialEdgePrior::new(0.2)), config).unwrap();
    chain.run().unwrap();

    assert_eq!(chain.cycles_done(), 60);
    assert_eq!(chain.samples().len(), 60);
    let names: Vec<&str> = chain.stats().iter().map(|stats| stats.name.as_str()).collect();
    assert_eq!(names, ["edge", "larget-simon", "tree-scaler"]);
    for stats in chain.stats() {
        assert_eq!(stats.proposed, 60);
        assert!(stats.accepted > 0);
        assert!(stats.acceptance_rate() <= 1.0);
    }

    let state = chain.state();
    assert_eq!(chain.samples().last().copied(), Some(state.ln_likelihood()));
    assert_relative_eq!(state.ln_likelihood(), fresh_ln_likelihood(state), max_relative = 1e-10);
    assert!(!state.evaluator().is_proposal_active());
}

#[test]
fn test_chain_is_reproducible() {
    let run = |seed: u64| {
        let config = ChainConfig::default().with_num_cycles(30).with_seed(seed).with_report_interval(0);
        let mut chain =
            Chain::new(Tree::from_newick(POLYTOMY_TREE).unwrap(), evaluator(), Box::new(FlatPrior), config).unwrap();
        chain.run().unwrap();
        (chain.samples().to_vec(), chain.state().tree().to_newick())
    };
    assert_eq!(run(5), run(5));
}

#[test]
fn test_zero_heating_accepts_everything() {
    let config = ChainConfig::default()
        .with_num_cycles(20)
        .with_seed(9)
        .with_moves(MoveConfig::default().with_heating(0.0));
    let mut chain = Chain::new(Tree::from_newick(POLYTOMY_TREE).unwrap(), evaluator(), Box::new(FlatPrior), config)
        .unwrap()
        .without_moves()
        .with_move(Box::new(EdgeMove::new(0.1)));
    chain.run().unwrap();
    assert_eq!(chain.stats().len(), 1);
    // With a flat posterior only the Hastings ratio decides
    assert!(chain.stats()[0].accepted >= 5);
}

#[test]
fn test_invalid_config_rejected() {
    let config = ChainConfig::default().with_moves(MoveConfig::default().with_min_edge_length(0.0));
    let result = Chain::new(Tree::from_newick(POLYTOMY_TREE).unwrap(), evaluator(), Box::new(FlatPrior), config);
    assert!(matches!(result, Err(ChainError::InvalidConfig(_))));
}

// --- TESTS LOGGING ---
/// A tracing layer that records the message of every event it sees.
struct MessageCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for MessageCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.messages.lock().unwrap().push(message);
        }
    }
}

#[test]
fn test_chain_reports_progress() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("phylik=info"))
        .with(MessageCapture { messages: messages.clone() });

    tracing::subscriber::with_default(subscriber, || {
        let config = ChainConfig::default().with_num_cycles(60).with_seed(2).with_report_interval(20);
        let mut chain =
            Chain::new(Tree::from_newick(POLYTOMY_TREE).unwrap(), evaluator(), Box::new(FlatPrior), config).unwrap();
        chain.run().unwrap();
    });

    let messages = messages.lock().unwrap();
    let count = |text: &str| messages.iter().filter(|m| m.as_str() == text).count();
    assert_eq!(count("chain initialized"), 1);
    assert_eq!(count("chain progress"), 3);
    assert_eq!(count("move summary"), 3);
    // Per-step events are below the filter
    assert_eq!(count("metropolis-hastings step"), 0);
}
