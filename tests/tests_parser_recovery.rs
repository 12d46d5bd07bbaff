//! Error tolerance: malformed input never fails, errors become marked
//! nodes, and the parse resynchronizes at recovery points.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{ARITH, SCRIPT, assert_round_trip, has_error_node, kind, nodes_of_kind};
use rstest::rstest;
use sylva::{ErrorCode, SyntaxKind, TextRange, TextSize, parse};

#[rstest]
#[case("1+")]
#[case("+")]
#[case("((1)")]
#[case("1 2")]
#[case("var")]
#[case("var x = ;")]
#[case("{ { {")]
#[case("}}}")]
#[case("\"unterminated")]
#[case("/* unterminated")]
fn test_malformed_input_always_yields_a_tree(#[case] source: &str) {
    // Never a panic, always a tree with at least one error marker.
    let tree = parse(&SCRIPT, source);
    assert!(tree.has_errors(), "expected errors for {source:?}");
    assert!(
        has_error_node(&tree.root()),
        "expected an error node for {source:?}:\n{}",
        tree.debug_dump()
    );
    assert_round_trip(&tree, source);
}

#[test]
fn test_incomplete_binary_expression() {
    // `1+` ends mid-expression: the binary node is completed with a
    // zero-width error operand at the end-of-input position.
    let tree = parse(&ARITH, "1+");
    assert!(tree.has_errors());
    assert_round_trip(&tree, "1+");

    let expr = kind(&ARITH, "expr");
    let outer = nodes_of_kind(&tree.root(), expr)
        .into_iter()
        .next()
        .expect("binary expression should be built");
    assert_eq!(outer.text_range(), TextRange::new(0.into(), 2.into()));

    let right = outer.last_child().expect("right operand");
    assert_eq!(
        right.text_range(),
        TextRange::empty(TextSize::new(2)),
        "error operand spans the end-of-input position:\n{}",
        tree.debug_dump()
    );
    assert!(has_error_node(&right));
}

#[test]
fn test_missing_token_is_inserted() {
    // A missing semicolon is repaired with a zero-width insertion and
    // reported as E0202.
    let tree = parse(&SCRIPT, "var x = 1");
    assert_round_trip(&tree, "var x = 1");
    assert!(
        tree.errors().iter().any(|e| e.code == ErrorCode::E0202),
        "errors: {:?}",
        tree.errors()
    );
    // The statement is still recognized.
    assert_eq!(nodes_of_kind(&tree.root(), kind(&SCRIPT, "var_decl")).len(), 1);
}

#[test]
fn test_recovery_resynchronizes_at_statement_boundary() {
    // The mangled first statement is skipped; the following statements
    // parse cleanly.
    let source = "var = = 1; var y = 2; return y;";
    let tree = parse(&SCRIPT, source);
    assert!(tree.has_errors());
    assert_round_trip(&tree, source);

    let decls = nodes_of_kind(&tree.root(), kind(&SCRIPT, "var_decl"));
    assert!(
        decls.iter().any(|d| !has_error_node(d)),
        "`var y = 2;` should parse cleanly:\n{}",
        tree.debug_dump()
    );
    let rets = nodes_of_kind(&tree.root(), kind(&SCRIPT, "ret_stmt"));
    assert_eq!(rets.len(), 1);
    assert!(!has_error_node(&rets[0]));
}

#[test]
fn test_error_ranges_point_at_failures() {
    let source = "var y = 2; @ return y;";
    let tree = parse(&SCRIPT, source);
    let error = tree
        .errors()
        .iter()
        .find(|e| e.code == ErrorCode::E0101)
        .expect("the stray `@` is a lexical error");
    assert_eq!(error.range, TextRange::new(11.into(), 12.into()));
    // Parsing continues after the bad byte.
    assert_eq!(nodes_of_kind(&tree.root(), kind(&SCRIPT, "ret_stmt")).len(), 1);
}

#[test]
fn test_unterminated_string_diagnostic() {
    let tree = parse(&SCRIPT, "var s = \"oops;\nvar t = 1;");
    assert!(
        tree.errors().iter().any(|e| e.code == ErrorCode::E0102),
        "errors: {:?}",
        tree.errors()
    );
    assert_round_trip(&tree, "var s = \"oops;\nvar t = 1;");
}

#[test]
fn test_unterminated_block_comment_diagnostic() {
    let tree = parse(&SCRIPT, "var x = 1; /* trailing");
    assert!(
        tree.errors().iter().any(|e| e.code == ErrorCode::E0103),
        "errors: {:?}",
        tree.errors()
    );
    assert_round_trip(&tree, "var x = 1; /* trailing");
}

#[test]
fn test_recovery_exhausted_on_deeply_malformed_input() {
    // Nothing after the opening braces can resynchronize: the parse ends
    // with a recovery-exhausted diagnostic but still returns a full tree.
    let source = "{ { var";
    let tree = parse(&SCRIPT, source);
    assert_round_trip(&tree, source);
    assert!(tree.has_errors());
}

#[test]
fn test_unexpected_end_of_input_code() {
    let tree = parse(&SCRIPT, "{ var x = 1;");
    assert_round_trip(&tree, "{ var x = 1;");
    assert!(
        tree.errors()
            .iter()
            .any(|e| matches!(e.code, ErrorCode::E0202 | ErrorCode::E0203)),
        "errors: {:?}",
        tree.errors()
    );
}

#[test]
fn test_errors_carry_expected_hints() {
    let tree = parse(&SCRIPT, "var 1 = x;");
    let error = tree
        .errors()
        .iter()
        .find(|e| e.code == ErrorCode::E0201 || e.code == ErrorCode::E0202)
        .expect("syntax error expected");
    assert!(error.hint.is_some(), "errors: {:?}", tree.errors());
}

#[test]
fn test_error_nodes_cover_skipped_material() {
    let source = "var x = 1; ) ) var y = 2;";
    let tree = parse(&SCRIPT, source);
    assert_round_trip(&tree, source);
    let error_nodes: Vec<_> = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::ERROR)
        .collect();
    assert!(!error_nodes.is_empty());
    // The skipped parens are inside error nodes.
    let covered: Vec<TextRange> = error_nodes.iter().map(|n| n.text_range()).collect();
    assert!(
        covered.iter().any(|r| r.contains(TextSize::new(11))),
        "`)` at 11 should be inside an error node: {covered:?}\n{}",
        tree.debug_dump()
    );
}
