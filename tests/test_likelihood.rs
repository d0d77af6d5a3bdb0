use approx::assert_relative_eq;
use phylik::config::{LikelihoodConfig, UnderflowMode};
use phylik::data::{AmbiguityTable, PatternData};
use phylik::likelihood::{LikelihoodError, LikelihoodEvaluator, SlotKind, SlotState};
use phylik::model::{NodeId, Tree};
use phylik::newick::NewickParser;
use phylik::parser::ByteParser;
use phylik::substitution::{IdentityModel, JukesCantor, RateCategories};

const BIRDS: [&str; 12] =
    ["Kiwi", "Weka", "Kea", "Kaka", "Tui", "Bellbird", "Fantail", "Kokako", "Takahe", "Pukeko", "Kakapo", "Moa"];

const BIRD_TREE: &str = "(((Kiwi:0.1,Weka:0.2):0.05,(Kea:0.12,Kaka:0.3):0.07):0.1,\
    ((Tui:0.2,Bellbird:0.15):0.1,(Fantail:0.25,Kokako:0.1):0.05):0.05,\
    (Takahe:0.1,(Pukeko:0.1,(Kakapo:0.3,Moa:0.4):0.02):0.08):0.12);";

/// Deterministic pseudo-random alignment over `ACGT`, with some sites shared
/// by all taxa so that patterns repeat.
fn bird_data(num_sites: usize, seed: u64) -> PatternData {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };
    let columns: Vec<Vec<char>> = (0..num_sites)
        .map(|site| {
            let shared = b"ACGT"[next() % 4] as char;
            BIRDS
                .iter()
                .map(|_| if site % 3 == 0 { shared } else { b"ACGT"[next() % 4] as char })
                .collect()
        })
        .collect();
    let sequences: Vec<(&str, String)> = BIRDS
        .iter()
        .enumerate()
        .map(|(taxon, name)| (*name, columns.iter().map(|column| column[taxon]).collect()))
        .collect();
    PatternData::from_sequences(&sequences, AmbiguityTable::dna()).unwrap()
}

fn evaluator_with(data: PatternData, config: &LikelihoodConfig) -> LikelihoodEvaluator {
    LikelihoodEvaluator::new(Box::new(JukesCantor::dna()), data, config).unwrap()
}

fn tip(tree: &Tree, name: &str) -> NodeId {
    tree.find_tip(tree.taxa().index_of(name).unwrap()).unwrap()
}

fn jc_probability(t: f64, same: bool) -> f64 {
    let decay = (-4.0 / 3.0 * t).exp();
    if same { 0.25 + 0.75 * decay } else { 0.25 - 0.25 * decay }
}

// --- TESTS VALUES ---
#[test]
fn test_star_tree_matches_direct_sum() {
    let tree = Tree::from_newick("(Kiwi:0.1,Weka:0.2,Kea:0.3);").unwrap();
    let data =
        PatternData::from_sequences(&[("Kiwi", "AAC"), ("Weka", "AGC"), ("Kea", "ATC")], AmbiguityTable::dna())
            .unwrap();
    let mut evaluator = evaluator_with(data, &LikelihoodConfig::default());
    let ln_l = evaluator.compute_log_likelihood(&tree, tree.root().unwrap()).unwrap();

    let lengths = [0.1, 0.2, 0.3];
    let columns = [[0, 0, 0], [0, 2, 3], [1, 1, 1]];
    let expected: f64 = columns
        .iter()
        .map(|column| {
            let site: f64 = (0..4)
                .map(|i| {
                    0.25 * lengths
                        .iter()
                        .zip(column)
                        .map(|(&t, &state)| jc_probability(t, i == state))
                        .product::<f64>()
                })
                .sum();
            site.ln()
        })
        .sum();
    assert_relative_eq!(ln_l, expected, max_relative = 1e-12);
}

#[test]
fn test_identity_model_scenario() {
    fn evaluate(sequences: &[(&str, &str)]) -> f64 {
        let tree = Tree::from_newick("((A:0.1,B:0.2):0.3,C:0.4,D:0.5);").unwrap();
        let data = PatternData::from_sequences(sequences, AmbiguityTable::dna()).unwrap();
        let config = LikelihoodConfig::default();
        let mut evaluator = LikelihoodEvaluator::new(Box::new(IdentityModel::new(4)), data, &config).unwrap();
        evaluator.compute_log_likelihood(&tree, tree.root().unwrap()).unwrap()
    }

    // Nothing observed: every history without substitutions fits
    assert_eq!(evaluate(&[("A", "NN"), ("B", "N?"), ("C", "-N"), ("D", "NN")]), 0.0);
    // Compatible data only pays for the root state
    assert_relative_eq!(
        evaluate(&[("A", "AC"), ("B", "AC"), ("C", "AC"), ("D", "AN")]),
        2.0 * 0.25_f64.ln(),
        max_relative = 1e-12
    );
    // A differing pair cannot be explained without substitutions
    assert_eq!(evaluate(&[("A", "AC"), ("B", "AC"), ("C", "AG"), ("D", "AC")]), f64::NEG_INFINITY);
}

#[test]
fn test_missing_tip_is_neutral() {
    let with_moa = Tree::from_newick("((Kiwi:0.1,Weka:0.2):0.3,Kea:0.4,Moa:0.5);").unwrap();
    let without = Tree::from_newick("((Kiwi:0.1,Weka:0.2):0.3,Kea:0.4);").unwrap();
    let sequences = [("Kiwi", "ACGTTA"), ("Weka", "ACGATA"), ("Kea", "CCGTAA"), ("Moa", "N?-NNN")];
    let data = PatternData::from_sequences(&sequences, AmbiguityTable::dna()).unwrap();

    let mut evaluator = evaluator_with(data.clone(), &LikelihoodConfig::default());
    let full = evaluator.compute_log_likelihood(&with_moa, with_moa.root().unwrap()).unwrap();
    let mut evaluator = evaluator_with(data, &LikelihoodConfig::default());
    let pruned = evaluator.compute_log_likelihood(&without, without.root().unwrap()).unwrap();
    assert_relative_eq!(full, pruned, max_relative = 1e-12);
}

#[test]
fn test_every_focal_node_gives_same_value() {
    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    let mut evaluator = evaluator_with(bird_data(60, 7), &LikelihoodConfig::default());
    let reference = evaluator.compute_log_likelihood(&tree, tree.root().unwrap()).unwrap();
    assert!(reference.is_finite());

    for node in tree.preorder_iter() {
        let ln_l = evaluator.compute_log_likelihood(&tree, node).unwrap();
        assert_relative_eq!(ln_l, reference, max_relative = 1e-10);
    }
    // Nothing left to recompute
    let ln_l = evaluator.compute_log_likelihood(&tree, tip(&tree, "Moa")).unwrap();
    assert_relative_eq!(ln_l, reference, max_relative = 1e-10);
    assert_eq!(evaluator.num_recomputed_last(), 0);
}

#[test]
fn test_reroot_keeps_value() {
    let mut tree = Tree::from_newick(BIRD_TREE).unwrap();
    let mut evaluator = evaluator_with(bird_data(40, 3), &LikelihoodConfig::default());
    let before = evaluator.compute_log_likelihood(&tree, tree.root().unwrap()).unwrap();

    let kea = tip(&tree, "Kea");
    tree.reroot_at(kea).unwrap();
    evaluator.invalidate_all();
    let after = evaluator.compute_log_likelihood(&tree, kea).unwrap();
    assert_relative_eq!(before, after, max_relative = 1e-10);
}

#[test]
fn test_rate_categories_average() {
    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    let data = bird_data(30, 11);
    let mut single = LikelihoodEvaluator::new(Box::new(JukesCantor::dna()), data.clone(), &LikelihoodConfig::default())
        .unwrap();
    let mut gamma = LikelihoodEvaluator::new(
        Box::new(JukesCantor::dna().with_rates(RateCategories::equal(vec![1.0, 1.0, 1.0]))),
        data,
        &LikelihoodConfig::default(),
    )
    .unwrap();
    let root = tree.root().unwrap();
    // Identical categories must not change anything
    assert_relative_eq!(
        single.compute_log_likelihood(&tree, root).unwrap(),
        gamma.compute_log_likelihood(&tree, root).unwrap(),
        max_relative = 1e-12
    );
}

// --- TESTS UNDERFLOW ---
#[test]
fn test_rescaling_does_not_change_value() {
    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let data = bird_data(50, 5);

    let mut plain = evaluator_with(data.clone(), &LikelihoodConfig::default().with_underflow(UnderflowMode::None));
    let expected = plain.compute_log_likelihood(&tree, root).unwrap();

    for mode in [UnderflowMode::Aggregate, UnderflowMode::PerPattern] {
        for trigger in [1, 2, 3] {
            let config = LikelihoodConfig::default().with_underflow(mode).with_trigger_sensitivity(trigger);
            let mut evaluator = evaluator_with(data.clone(), &config);
            let ln_l = evaluator.compute_log_likelihood(&tree, root).unwrap();
            assert_relative_eq!(ln_l, expected, max_relative = 1e-10);

            // Other focal nodes combine differently scaled CLAs
            let ln_l = evaluator.compute_log_likelihood(&tree, tip(&tree, "Tui")).unwrap();
            assert_relative_eq!(ln_l, expected, max_relative = 1e-10);
        }
    }
}

#[test]
fn test_site_likelihoods() {
    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let data = bird_data(45, 13);
    let counts = data.pattern_counts().to_vec();

    for mode in [UnderflowMode::None, UnderflowMode::PerPattern] {
        let config = LikelihoodConfig::default().with_underflow(mode).with_trigger_sensitivity(1);
        let mut evaluator = evaluator_with(data.clone(), &config);
        let total = evaluator.compute_log_likelihood(&tree, root).unwrap();
        let sites = evaluator.site_log_likelihoods(&tree, root).unwrap();
        assert_eq!(sites.len(), counts.len());
        let weighted: f64 = sites.iter().zip(&counts).map(|(s, c)| s * c).sum();
        assert_relative_eq!(weighted, total, max_relative = 1e-10);
    }

    let mut evaluator = evaluator_with(data, &LikelihoodConfig::default());
    assert_eq!(evaluator.site_log_likelihoods(&tree, root), Err(LikelihoodError::SiteLikelihoodsUnavailable));
}

// --- TESTS INCREMENTAL EVALUATION ---
#[test]
fn test_edge_change_matches_fresh_evaluation() {
    let mut tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let data = bird_data(40, 17);
    let mut evaluator = evaluator_with(data.clone(), &LikelihoodConfig::default());
    evaluator.compute_log_likelihood(&tree, root).unwrap();
    let full_count = evaluator.num_recomputed_last();

    for (name, length) in [("Kakapo", 0.05), ("Fantail", 0.9), ("Weka", 0.01)] {
        let node = tip(&tree, name);
        tree.set_edge_length(node, length);
        evaluator.invalidate_away_from(&tree, node);
        let updated = evaluator.compute_log_likelihood(&tree, root).unwrap();
        assert!(evaluator.num_recomputed_last() < full_count);

        let mut fresh = evaluator_with(data.clone(), &LikelihoodConfig::default());
        assert_relative_eq!(updated, fresh.compute_log_likelihood(&tree, root).unwrap(), max_relative = 1e-12);
    }
}

#[test]
fn test_invalidation_reaches_all_dependents() {
    let mut tree = Tree::from_newick(BIRD_TREE).unwrap();
    let mut evaluator = evaluator_with(bird_data(20, 19), &LikelihoodConfig::default());
    // Fill every directed edge
    for node in tree.preorder_iter().collect::<Vec<_>>() {
        evaluator.compute_log_likelihood(&tree, node).unwrap();
    }

    let kiwi = tip(&tree, "Kiwi");
    let parent = tree.parent(kiwi).unwrap();
    let weka = tip(&tree, "Weka");
    tree.set_edge_length(kiwi, 0.33);
    evaluator.invalidate_away_from(&tree, kiwi);

    // CLAs whose clade holds the changed edge are stale, the others stay
    assert_eq!(evaluator.slot_state(kiwi, SlotKind::Parental), SlotState::Valid);
    assert_eq!(evaluator.slot_state(parent, SlotKind::Filial), SlotState::Invalid);
    assert_eq!(evaluator.slot_state(weka, SlotKind::Parental), SlotState::Invalid);
    let root = tree.root().unwrap();
    let first = tree.left_child(root).unwrap();
    assert_eq!(tree.parent(parent), Some(first));
    assert_eq!(evaluator.slot_state(first, SlotKind::Filial), SlotState::Invalid);
    let second = tree.right_sib(first).unwrap();
    assert_eq!(evaluator.slot_state(second, SlotKind::Filial), SlotState::Valid);
    assert_eq!(evaluator.slot_state(second, SlotKind::Parental), SlotState::Invalid);

    for node in tree.preorder_iter().collect::<Vec<_>>() {
        let mut fresh = evaluator_with(bird_data(20, 19), &LikelihoodConfig::default());
        assert_relative_eq!(
            evaluator.compute_log_likelihood(&tree, node).unwrap(),
            fresh.compute_log_likelihood(&tree, node).unwrap(),
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_internal_edge_change_keeps_own_clade() {
    let mut tree = Tree::from_newick("((Kiwi:0.1,Weka:0.2):0.3,(Kea:0.1,Kaka:0.2):0.6);").unwrap();
    let root = tree.root().unwrap();
    let clade = tree.left_child(root).unwrap();
    let other = tree.right_sib(clade).unwrap();
    let data = bird_data(30, 43);
    let mut evaluator = evaluator_with(data.clone(), &LikelihoodConfig::default());
    for node in tree.preorder_iter().collect::<Vec<_>>() {
        evaluator.compute_log_likelihood(&tree, node).unwrap();
    }

    tree.set_edge_length(clade, 0.45);
    evaluator.invalidate_away_from(&tree, clade);
    // The clade's own CLA only combines the edges below it
    assert_eq!(evaluator.slot_state(clade, SlotKind::Filial), SlotState::Valid);
    assert_eq!(evaluator.slot_state(other, SlotKind::Filial), SlotState::Valid);
    assert_eq!(evaluator.slot_state(other, SlotKind::Parental), SlotState::Invalid);

    // Only the transition matrix on the changed edge differs at the root
    let updated = evaluator.compute_log_likelihood(&tree, root).unwrap();
    assert_eq!(evaluator.num_recomputed_last(), 0);
    let mut fresh = evaluator_with(data.clone(), &LikelihoodConfig::default());
    assert_relative_eq!(updated, fresh.compute_log_likelihood(&tree, root).unwrap(), max_relative = 1e-12);

    for node in tree.preorder_iter().collect::<Vec<_>>() {
        let mut fresh = evaluator_with(data.clone(), &LikelihoodConfig::default());
        assert_relative_eq!(
            evaluator.compute_log_likelihood(&tree, node).unwrap(),
            fresh.compute_log_likelihood(&tree, node).unwrap(),
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_evaluator_reused_for_permuted_taxa() {
    let data = PatternData::from_sequences(
        &[("Kea", "AAAA"), ("Tui", "AAAC"), ("Moa", "GGTT")],
        AmbiguityTable::dna(),
    )
    .unwrap();
    let first = Tree::from_newick("(Kea:0.1,Tui:0.2,Moa:0.3);").unwrap();
    let second = Tree::from_newick("(Moa:0.1,Tui:0.2,Kea:0.3);").unwrap();
    let mut evaluator = evaluator_with(data.clone(), &LikelihoodConfig::default());

    let on_first = evaluator.compute_log_likelihood(&first, first.root().unwrap()).unwrap();
    evaluator.invalidate_all();
    let on_second = evaluator.compute_log_likelihood(&second, second.root().unwrap()).unwrap();

    let mut fresh = evaluator_with(data, &LikelihoodConfig::default());
    let expected = fresh.compute_log_likelihood(&second, second.root().unwrap()).unwrap();
    assert_relative_eq!(on_second, expected, max_relative = 1e-12);
    assert!((on_first - on_second).abs() > 1.0);
}

#[test]
fn test_proposal_restore_returns_buffers() {
    let mut tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let mut evaluator = evaluator_with(bird_data(30, 23), &LikelihoodConfig::default());
    let before = evaluator.compute_log_likelihood(&tree, root).unwrap();
    let states_before = evaluator.slot_states();
    let outstanding = evaluator.pool().outstanding();

    let pukeko = tip(&tree, "Pukeko");
    let length = tree.edge_length(pukeko).unwrap();
    let mut created = None;
    for round in 0..20 {
        evaluator.begin_proposal();
        tree.set_edge_length(pukeko, length * (2.0 + round as f64));
        evaluator.invalidate_away_from(&tree, pukeko);
        let proposed = evaluator.compute_log_likelihood(&tree, root).unwrap();
        assert!(proposed != before);

        tree.set_edge_length(pukeko, length);
        evaluator.restore_from_cache();
        assert_eq!(evaluator.slot_states(), states_before);
        assert_eq!(evaluator.pool().outstanding(), outstanding);
        assert_eq!(evaluator.compute_log_likelihood(&tree, root).unwrap(), before);
        assert_eq!(evaluator.num_recomputed_last(), 0);

        // The pool stops growing once spare buffers exist
        match created {
            None => created = Some(evaluator.pool().created_count()),
            Some(count) => assert_eq!(evaluator.pool().created_count(), count),
        }
    }
}

#[test]
fn test_proposal_discard_keeps_new_state() {
    let mut tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let data = bird_data(30, 29);
    let mut evaluator = evaluator_with(data.clone(), &LikelihoodConfig::default());
    evaluator.compute_log_likelihood(&tree, root).unwrap();
    let outstanding = evaluator.pool().outstanding();

    evaluator.begin_proposal();
    let takahe = tip(&tree, "Takahe");
    tree.set_edge_length(takahe, 0.42);
    evaluator.invalidate_away_from(&tree, takahe);
    let proposed = evaluator.compute_log_likelihood(&tree, root).unwrap();
    evaluator.discard_cache();

    assert!(!evaluator.is_proposal_active());
    assert_eq!(evaluator.pool().outstanding(), outstanding);
    assert_eq!(evaluator.compute_log_likelihood(&tree, root).unwrap(), proposed);
    let mut fresh = evaluator_with(data, &LikelihoodConfig::default());
    assert_relative_eq!(proposed, fresh.compute_log_likelihood(&tree, root).unwrap(), max_relative = 1e-12);
}

#[test]
fn test_invalidate_all_reuses_buffers() {
    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let mut evaluator = evaluator_with(bird_data(25, 31), &LikelihoodConfig::default());
    let first = evaluator.compute_log_likelihood(&tree, root).unwrap();
    let recomputed = evaluator.num_recomputed_last();
    let created = evaluator.pool().created_count();

    for _ in 0..5 {
        evaluator.invalidate_all();
        assert_eq!(evaluator.compute_log_likelihood(&tree, root).unwrap(), first);
        assert_eq!(evaluator.num_recomputed_last(), recomputed);
        assert_eq!(evaluator.pool().created_count(), created);
    }
}

#[test]
fn test_set_model() {
    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    let root = tree.root().unwrap();
    let data = bird_data(30, 37);
    let mut evaluator = evaluator_with(data.clone(), &LikelihoodConfig::default());
    let jc = evaluator.compute_log_likelihood(&tree, root).unwrap();

    let rates = RateCategories::equal(vec![0.2, 0.8, 2.0]);
    evaluator.set_model(Box::new(JukesCantor::dna().with_rates(rates.clone()))).unwrap();
    let gamma = evaluator.compute_log_likelihood(&tree, root).unwrap();
    let mut fresh =
        LikelihoodEvaluator::new(Box::new(JukesCantor::dna().with_rates(rates)), data, &LikelihoodConfig::default())
            .unwrap();
    assert_relative_eq!(gamma, fresh.compute_log_likelihood(&tree, root).unwrap(), max_relative = 1e-12);
    assert_eq!(evaluator.pool().dims().num_rates, 3);

    evaluator.set_model(Box::new(JukesCantor::dna())).unwrap();
    assert_relative_eq!(evaluator.compute_log_likelihood(&tree, root).unwrap(), jc, max_relative = 1e-12);

    let err = evaluator.set_model(Box::new(JukesCantor::new(20))).unwrap_err();
    assert_eq!(err, LikelihoodError::StateCountMismatch { model: 20, data: 4 });
}

// --- TESTS ERRORS ---
#[test]
fn test_evaluation_errors() {
    let mut evaluator = evaluator_with(bird_data(10, 41), &LikelihoodConfig::default());

    let tree = Tree::from_newick(BIRD_TREE).unwrap();
    assert_eq!(evaluator.compute_log_likelihood(&tree, 999), Err(LikelihoodError::UnknownNode(999)));

    let single = Tree::from_newick("Kiwi;").unwrap();
    assert_eq!(
        evaluator.compute_log_likelihood(&single, single.root().unwrap()),
        Err(LikelihoodError::EmptyTree)
    );

    let mut parser = NewickParser::new().without_default_edge_length();
    let unset = parser.parse_str(&mut ByteParser::for_str("((Kiwi,Weka):0.3,Kea:0.4);")).unwrap();
    let result = evaluator.compute_log_likelihood(&unset, unset.root().unwrap());
    assert!(matches!(result, Err(LikelihoodError::MissingEdgeLength(_))));
}
