//! Tree handle and cursor API: navigation, covering queries, line index.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{SCRIPT, kind};
use sylva::{LineCol, SyntaxKind, TextRange, TextSize, parse};

const SOURCE: &str = "var a = 1;\n{ var b = a + 2; }\n";

#[test]
fn test_cursor_navigation() {
    let tree = parse(&SCRIPT, SOURCE);
    assert!(!tree.has_errors(), "errors: {:?}", tree.errors());

    let mut cursor = tree.cursor();
    assert_eq!(cursor.kind(), SyntaxKind::ROOT);
    assert!(!cursor.goto_parent(), "root has no parent");
    assert!(!cursor.goto_next_sibling(), "root has no siblings");

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "file"));

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "var_decl"));
    assert!(!cursor.goto_prev_sibling());

    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "block"));
    assert!(!cursor.goto_next_sibling());

    assert!(cursor.goto_prev_sibling());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "var_decl"));

    assert!(cursor.goto_parent());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "file"));

    assert!(cursor.goto_last_child());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "block"));
}

#[test]
fn test_cursor_offset_descent() {
    let tree = parse(&SCRIPT, SOURCE);
    let mut cursor = tree.cursor();

    // Offset 24 sits inside `a + 2` in the block's statement.
    assert!(cursor.goto_smallest_for_offset(TextSize::new(24)));
    assert_eq!(cursor.kind(), kind(&SCRIPT, "binary"));
    assert!(cursor.range().contains_inclusive(TextSize::new(24)));

    // Walking back up passes through the enclosing statement and block.
    assert!(cursor.goto_parent());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "var_decl"));
    assert!(cursor.goto_parent());
    assert_eq!(cursor.kind(), kind(&SCRIPT, "block"));

    // An offset outside the current node is refused.
    let mut inner = tree.cursor();
    assert!(inner.goto_smallest_for_offset(TextSize::new(2)));
    assert!(!inner.goto_smallest_for_offset(TextSize::new(25)));
}

#[test]
fn test_covering_node_queries() {
    let tree = parse(&SCRIPT, SOURCE);

    // Smallest node containing the range of `a + 2`.
    let covering = tree.covering_node(TextRange::new(21.into(), 26.into()));
    assert_eq!(covering.kind(), kind(&SCRIPT, "binary"));

    // A range spanning both statements is only covered by `file`.
    let covering = tree.covering_node(TextRange::new(4.into(), 15.into()));
    assert_eq!(covering.kind(), kind(&SCRIPT, "file"));

    // A range past the end clamps to the root.
    let covering = tree.covering_node(TextRange::new(0.into(), 999.into()));
    assert_eq!(covering.kind(), SyntaxKind::ROOT);
}

#[test]
fn test_node_and_token_at_offset() {
    let tree = parse(&SCRIPT, SOURCE);

    let node = tree.node_at_offset(TextSize::new(8));
    assert_eq!(node.kind(), kind(&SCRIPT, "var_decl"));

    let token = tree.token_at_offset(TextSize::new(8)).expect("token");
    assert_eq!(token.kind(), SyntaxKind::INT);
    assert_eq!(token.text(), "1");

    assert!(tree.token_at_offset(TextSize::new(999)).is_none());
}

#[test]
fn test_line_index() {
    let tree = parse(&SCRIPT, SOURCE);
    let index = tree.line_index();
    assert_eq!(index.line_col(TextSize::new(0)), LineCol::new(0, 0));
    assert_eq!(index.line_col(TextSize::new(13)), LineCol::new(1, 2));
    assert_eq!(index.offset(LineCol::new(1, 2)), Some(TextSize::new(13)));
    // The cache hands out the same index on repeated calls.
    let again = tree.line_index();
    assert!(std::sync::Arc::ptr_eq(&index, &again));
}

#[test]
fn test_tree_is_shareable_across_threads() {
    let tree = parse(&SCRIPT, SOURCE);
    let handle = tree.clone();
    let worker = std::thread::spawn(move || {
        // Concurrent readers of a published tree see the same structure.
        let decls: Vec<_> = handle
            .root()
            .descendants()
            .filter(|n| n.kind() == kind(&SCRIPT, "var_decl"))
            .collect();
        decls.len()
    });
    let local: Vec<_> = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == kind(&SCRIPT, "var_decl"))
        .collect();
    assert_eq!(worker.join().expect("worker thread"), local.len());
}
