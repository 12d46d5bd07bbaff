//! Incremental reparse: the core law is that `reparse(tree, edit, text')`
//! is structurally identical to `parse(text')`, whether or not the fast
//! path applies. Diagnostics must match too.

#[path = "helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use helpers::{ARITH, SCRIPT, assert_round_trip, assert_same_shape, kind, nodes_of_kind};
use rstest::rstest;
use sylva::{Edit, Grammar, TextRange, TextSize, parse, reparse};

/// Apply an edit both ways and require identical structure and
/// diagnostics.
fn check_equivalence(grammar: &Arc<Grammar>, source: &str, range: (u32, u32), replacement: &str) {
    let old_tree = parse(grammar, source);
    let (new_text, edit) = Edit::replace_range(
        source,
        TextRange::new(range.0.into(), range.1.into()),
        replacement,
    );
    let incremental = reparse(&old_tree, &edit, &new_text);
    let batch = parse(grammar, &new_text);
    assert_same_shape(&incremental, &batch);
    assert_eq!(
        incremental.errors(),
        batch.errors(),
        "diagnostics must match a batch parse"
    );
    assert_round_trip(&incremental, &new_text);
}

#[test]
fn test_edit_scenario_from_arithmetic() {
    // Replacing "2" with "3" in "1+2" is equivalent to parsing "1+3".
    check_equivalence(&ARITH, "1+2", (2, 3), "3");
}

#[rstest]
#[case("var x = 1; var y = 2;", (8, 9), "42")] // grow a literal
#[case("var x = 1; var y = 2;", (8, 9), "z")] // change token kind
#[case("var x = 10 + 2; var y = 2;", (8, 10), "5")] // shrink a literal
#[case("var x = 1; var y = 2;", (9, 9), "+3")] // insert into a statement
#[case("{ var a = 1; var b = 2; } return 3;", (10, 11), "(4+5)")] // inside a block
#[case("return 1+2*3;", (9, 10), "9")] // inside a return
fn test_clean_statement_edits(
    #[case] source: &str,
    #[case] range: (u32, u32),
    #[case] replacement: &str,
) {
    check_equivalence(&SCRIPT, source, range, replacement);
}

#[rstest]
#[case("var x = 1; var y = 2;", (0, 3), "var")] // touches a statement start
#[case("var x = 1; var y = 2;", (9, 10), "")] // deletes a terminator
#[case("var x = 1; var y = 2;", (4, 16), "q")] // spans two statements
#[case("var x = 1;", (0, 10), "return 2;")] // replaces everything
fn test_boundary_edits_fall_back(
    #[case] source: &str,
    #[case] range: (u32, u32),
    #[case] replacement: &str,
) {
    // No safe boundary exists; the fallback still satisfies the law.
    check_equivalence(&SCRIPT, source, range, replacement);
}

#[rstest]
#[case("var x = 1; var y = 2;", (8, 9), "")] // introduce an error
#[case("var x = ; var y = 2;", (8, 8), "1")] // fix an error
#[case("var x = 1 var y = 2;", (8, 9), "3")] // edit near an existing error
fn test_edits_around_errors(
    #[case] source: &str,
    #[case] range: (u32, u32),
    #[case] replacement: &str,
) {
    check_equivalence(&SCRIPT, source, range, replacement);
}

#[test]
fn test_edit_cannot_merge_tokens_across_the_seam() {
    // Editing "1" to "2 7" keeps the statement clean; editing it so the
    // terminator would merge into a comment must not take the fast path.
    // `var x = 1/; var y = 2;` → making the `1` a `/` would form `//`,
    // turning the terminator into a comment.
    check_equivalence(&SCRIPT, "var x = 1/2; var y = 2;", (8, 9), "3");
    check_equivalence(&SCRIPT, "var x = 12/1; var y = 2;", (9, 10), "/");
}

#[test]
fn test_unaffected_subtrees_are_reused() {
    let source = "var a = 1; var b = 2; var c = 3;";
    let old_tree = parse(&SCRIPT, source);
    assert!(!old_tree.has_errors());

    // Edit strictly inside the second statement.
    let (new_text, edit) =
        Edit::replace_range(source, TextRange::new(19.into(), 20.into()), "42");
    let new_tree = reparse(&old_tree, &edit, &new_text);
    assert_same_shape(&new_tree, &parse(&SCRIPT, &new_text));

    let var_decl = kind(&SCRIPT, "var_decl");
    let old_decls = nodes_of_kind(&old_tree.root(), var_decl);
    let new_decls = nodes_of_kind(&new_tree.root(), var_decl);
    assert_eq!(old_decls.len(), 3);
    assert_eq!(new_decls.len(), 3);

    // The first statement's green node is shared with the old tree, not
    // rebuilt: incremental reuse is structural sharing.
    let old_green = old_decls[0].green();
    let new_green = new_decls[0].green();
    assert!(
        std::ptr::eq(&*old_green, &*new_green),
        "untouched leading statement should share its green node"
    );

    // The statement after the edit shifted right by one byte but kept its
    // shape.
    assert_eq!(
        old_decls[2].text_range(),
        TextRange::new(22.into(), 32.into())
    );
    assert_eq!(
        new_decls[2].text_range(),
        TextRange::new(23.into(), 33.into())
    );
}

#[test]
fn test_diagnostics_shift_across_an_edit() {
    // The error lives in the last statement; an edit earlier in the text
    // must shift its range exactly like a batch parse would.
    let source = "var a = 1; var b = ;";
    check_equivalence(&SCRIPT, source, (8, 9), "1234");
}

#[test]
fn test_sequential_edits() {
    // A chain of edits, reparsing incrementally at each step, stays
    // equivalent to batch parsing the final text.
    let mut text = String::from("var a = 1; { var b = 2; } return a;");
    let mut tree = parse(&SCRIPT, &text);
    let edits: &[(u32, u32, &str)] = &[
        (8, 9, "100"),
        (23, 24, "b+1"),
        (4, 5, "renamed"),
        (0, 0, "var fresh = 7; "),
    ];
    for &(start, end, replacement) in edits {
        let (new_text, edit) =
            Edit::replace_range(&text, TextRange::new(start.into(), end.into()), replacement);
        tree = reparse(&tree, &edit, &new_text);
        let batch = parse(&SCRIPT, &new_text);
        assert_same_shape(&tree, &batch);
        assert_eq!(tree.errors(), batch.errors());
        text = new_text;
    }
}

#[test]
fn test_grammar_version_is_preserved() {
    let source = "var a = 1;";
    let tree = parse(&SCRIPT, source);
    let (new_text, edit) = Edit::replace_range(source, TextRange::new(8.into(), 9.into()), "2");
    let new_tree = reparse(&tree, &edit, &new_text);
    assert!(Arc::ptr_eq(tree.grammar(), new_tree.grammar()));
    assert_eq!(new_tree.grammar_version(), tree.grammar_version());
    assert_eq!(new_tree.source_len(), TextSize::of(new_text.as_str()));
}

#[test]
fn test_old_tree_is_untouched_by_reparse() {
    let source = "var a = 1; var b = 2;";
    let old_tree = parse(&SCRIPT, source);
    let before = old_tree.debug_dump();
    let (new_text, edit) = Edit::replace_range(source, TextRange::new(8.into(), 9.into()), "99");
    let _new_tree = reparse(&old_tree, &edit, &new_text);
    // Publishing an edited tree never mutates the original.
    assert_eq!(old_tree.debug_dump(), before);
    assert_eq!(old_tree.text(), source);
}
