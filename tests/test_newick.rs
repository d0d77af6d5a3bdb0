use phylik::model::{TaxonTable, Tree, TreeError};
use phylik::parser::ParsingError;
use std::error::Error;
use phylik::newick::{DEFAULT_EDGE_LENGTH, NewickParser, parse_str, to_newick, write_newick};
use phylik::parser::{ByteParser, ParsingErrorKind};

fn tip_length(tree: &Tree, name: &str) -> Option<f64> {
    let taxon = tree.taxa().index_of(name)?;
    tree.edge_length(tree.find_tip(taxon)?)
}

// --- TESTS NEWICK STRING PARSING ---
#[test]
fn test_basic_tree() {
    let tree = parse_str("((Kiwi:1.0,Weka:2.0):3.0,Kea:4.0):0.5;").unwrap();

    assert_eq!(tree.num_tips(), 3);
    assert_eq!(tree.num_internals(), 2);
    assert_eq!(tree.num_nodes(), 5);
    assert_eq!(tree.taxa().len(), 3);
    assert_eq!(tree.taxa().names(), &["Kiwi", "Weka", "Kea"]);

    // Root length is ignored
    let root = tree.root().unwrap();
    assert_eq!(tree.edge_length(root), None);
    let clade = tree.left_child(root).unwrap();
    assert_eq!(tree.edge_length(clade), Some(3.0));
    assert_eq!(tip_length(&tree, "Weka"), Some(2.0));
    assert!(tree.check_threading());
}

#[test]
fn test_polytomy_and_labels() {
    let newick = "[start] ( 'Baillon''s Crake':0.1 , Pukeko:0.2 , Takahe:0.3 , (Kea:1,Kaka:1)Nestor:0.4 ) ;";
    let tree = parse_str(newick).unwrap();

    let root = tree.root().unwrap();
    assert_eq!(tree.count_children(root), 4);
    assert!(tree.taxa().contains("Baillon's Crake"));
    // Internal labels are not taxa
    assert!(!tree.taxa().contains("Nestor"));
    assert_eq!(tip_length(&tree, "Takahe"), Some(0.3));
}

#[test]
fn test_default_edge_length() {
    let tree = parse_str("((Kiwi,Weka),Kea:2);").unwrap();
    assert_eq!(tip_length(&tree, "Kiwi"), Some(DEFAULT_EDGE_LENGTH));
    assert_eq!(tip_length(&tree, "Kea"), Some(2.0));

    let mut parser = NewickParser::new().without_default_edge_length();
    let tree = parser.parse_str(&mut ByteParser::for_str("((Kiwi,Weka),Kea:2);")).unwrap();
    assert_eq!(tip_length(&tree, "Kiwi"), None);
}

#[test]
fn test_fixed_taxa() {
    let taxa = TaxonTable::from_names(&["Kea", "Kaka", "Kiwi"]);
    let mut parser = NewickParser::new().with_taxa(taxa);

    let tree = parser.parse_str(&mut ByteParser::for_str("(Kiwi:1,(Kaka:1,Kea:1):1);")).unwrap();
    assert_eq!(tree.taxa().index_of("Kea"), Some(0));
    assert_eq!(tree.taxon(tree.first_leaf().unwrap()), Some(2));

    let err = parser.parse_str(&mut ByteParser::for_str("(Kiwi:1,Moa:1);")).unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::UnresolvedLabel(label) if label == "Moa"));
}

#[test]
fn test_reroot_at_first_leaf() {
    let mut parser = NewickParser::new().with_reroot_at_first_leaf();
    let tree = parser.parse_str(&mut ByteParser::for_str("((Kiwi:1,Weka:2):0.5,Kea:1.5);")).unwrap();
    let root = tree.root().unwrap();
    assert!(tree.is_tip(root));
    assert_eq!(tree.taxa().name(tree.taxon(root).unwrap()), Some("Kiwi"));
    assert_eq!(tree.total_edge_length(), 5.0);
}

#[test]
fn test_parse_all() {
    let input = "(Kea:1,Kaka:1);\n[second] ((Kea:1,Kaka:1):1,Kiwi:2);\n";
    let trees = NewickParser::new().parse_all(&mut ByteParser::for_str(input)).unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[1].num_tips(), 3);
}

// --- TESTS ERRORS ---
#[test]
fn test_duplicate_label() {
    let err = parse_str("(Kea:1,(Kea:1,Kaka:1):1);").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::DuplicateLabel(label) if label == "Kea"));
}

#[test]
fn test_invalid_edge_length() {
    let err = parse_str("(Kea:1,Kaka:-1);").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::InvalidEdgeLength(_)));

    let err = parse_str("(Kea:1,Kaka:abc);").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::InvalidEdgeLength(_)));
}

#[test]
fn test_missing_semicolon_and_eof() {
    let err = parse_str("(Kea:1,Kaka:1)").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::UnexpectedEOF));

    let err = parse_str("(Kea:1,Kaka:1)x:1 y;").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::InvalidNewickString(_)));
}

#[test]
fn test_unclosed_quote_reported() {
    let err = parse_str("('Kea:1,Kaka:1);").unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorKind::UnclosedQuote));
}

#[test]
fn test_error_messages_and_source() {
    let err = parse_str("(Kea:1,Kaka:-1);").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Invalid edge length '-1' at position"));
    assert!(message.contains("Context (next"));
    assert!(err.source().is_some());

    let err = ParsingError::from(TreeError::Empty);
    assert_eq!(err.to_string(), format!("Invalid tree structure - {} at position 0", TreeError::Empty));
    let kind = err.source().unwrap();
    let tree_error = kind.source().and_then(|source| source.downcast_ref::<TreeError>());
    assert_eq!(tree_error, Some(&TreeError::Empty));
}

// --- TESTS WRITING ---
#[test]
fn test_write_read_identity() {
    let newick = "((Kiwi:1,'Baillon''s Crake':2.5):0.5,Kea:1.5,(Kaka:0.25,Tui:0.125):1);";
    let tree = parse_str(newick).unwrap();
    assert_eq!(to_newick(&tree), newick);
    assert_eq!(tree.to_newick(), newick);
}

#[test]
fn test_write_tip_rooted_tree_unrooted() {
    let mut tree = parse_str("((Kiwi:1,Weka:2):0.5,Kea:1.5,Kaka:1);").unwrap();
    let kiwi = tree.first_leaf().unwrap();
    tree.reroot_at(kiwi).unwrap();

    let written = tree.to_newick();
    assert!(written.starts_with("(Kiwi:1,"));
    let reread = parse_str(&written).unwrap();
    assert_eq!(reread.num_tips(), 4);
    assert_eq!(reread.total_edge_length(), tree.total_edge_length());
}

#[test]
fn test_write_multiple() {
    let trees = vec![parse_str("(Kea:1,Kaka:1);").unwrap(), parse_str("(Kiwi:1,Weka:1);").unwrap()];
    let mut out = Vec::new();
    write_newick(&mut out, &trees).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "(Kea:1,Kaka:1);\n(Kiwi:1,Weka:1);\n");
}
