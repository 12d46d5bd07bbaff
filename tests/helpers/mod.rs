//! Common grammar fixtures and assertions for integration tests.

// Each test crate includes this module and uses its own subset.
#![allow(dead_code)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use sylva::{Assoc, Grammar, GrammarBuilder, SyntaxKind, SyntaxNode, Tree};

/// Arithmetic expressions: binary operators with precedence, parentheses,
/// integer/identifier atoms. The start symbol `expr` is also the only node
/// kind, so trees stay easy to assert on.
pub static ARITH: Lazy<Arc<Grammar>> = Lazy::new(arith_grammar);

fn arith_grammar() -> Arc<Grammar> {
    let mut g = GrammarBuilder::new("arith", 1);
    let expr = g.nonterminal("expr");
    let plus = g.operator("+");
    let minus = g.operator("-");
    let star = g.operator("*");
    let slash = g.operator("/");
    let lparen = g.operator("(");
    let rparen = g.operator(")");
    g.precedence(Assoc::Left, &[plus, minus]);
    g.precedence(Assoc::Left, &[star, slash]);
    g.production(expr, &[expr, plus, expr]);
    g.production(expr, &[expr, minus, expr]);
    g.production(expr, &[expr, star, expr]);
    g.production(expr, &[expr, slash, expr]);
    g.production(expr, &[lparen, expr, rparen]);
    g.production(expr, &[g.int_literal()]);
    g.production(expr, &[g.ident()]);
    g.start(expr);
    g.build().expect("arith grammar should build")
}

/// A small statement language: `var` declarations, expression statements,
/// `return`, and braced blocks. Statements and blocks are recovery points,
/// which also makes them incremental reparse boundaries.
pub static SCRIPT: Lazy<Arc<Grammar>> = Lazy::new(script_grammar);

fn script_grammar() -> Arc<Grammar> {
    let mut g = GrammarBuilder::new("script", 1);

    let file = g.nonterminal("file");
    let stmts = g.nonterminal("_stmts");
    let stmt = g.nonterminal("_stmt");
    let var_decl = g.nonterminal("var_decl");
    let expr_stmt = g.nonterminal("expr_stmt");
    let ret_stmt = g.nonterminal("ret_stmt");
    let block = g.nonterminal("block");
    let expr = g.nonterminal("_expr");
    let binary = g.nonterminal("binary");
    let primary = g.nonterminal("_primary");
    let paren = g.nonterminal("paren");

    let var_kw = g.keyword("var");
    let return_kw = g.keyword("return");
    let eq = g.operator("=");
    let semi = g.operator(";");
    let lbrace = g.operator("{");
    let rbrace = g.operator("}");
    let lparen = g.operator("(");
    let rparen = g.operator(")");
    let plus = g.operator("+");
    let minus = g.operator("-");
    let star = g.operator("*");

    g.precedence(Assoc::Left, &[plus, minus]);
    g.precedence(Assoc::Left, &[star]);

    g.production(file, &[stmts]);
    g.production(stmts, &[stmts, stmt]);
    g.production(stmts, &[]);
    g.production(stmt, &[var_decl]);
    g.production(stmt, &[expr_stmt]);
    g.production(stmt, &[ret_stmt]);
    g.production(stmt, &[block]);
    g.production(var_decl, &[var_kw, g.ident(), eq, expr, semi]);
    g.production(expr_stmt, &[expr, semi]);
    g.production(ret_stmt, &[return_kw, expr, semi]);
    g.production(ret_stmt, &[return_kw, semi]);
    g.production(block, &[lbrace, stmts, rbrace]);
    g.production(expr, &[binary]);
    g.production(expr, &[primary]);
    g.production(binary, &[expr, plus, expr]);
    g.production(binary, &[expr, minus, expr]);
    g.production(binary, &[expr, star, expr]);
    g.production(primary, &[g.int_literal()]);
    g.production(primary, &[g.ident()]);
    g.production(primary, &[g.string_literal()]);
    g.production(primary, &[paren]);
    g.production(paren, &[lparen, expr, rparen]);

    g.recover_at(var_decl, &[semi]);
    g.recover_at(expr_stmt, &[semi]);
    g.recover_at(ret_stmt, &[semi]);
    g.recover_at(block, &[rbrace]);

    g.start(file);
    g.build().expect("script grammar should build")
}

/// Kind of a named symbol, for assertions.
pub fn kind(grammar: &Grammar, name: &str) -> SyntaxKind {
    grammar
        .kind_by_name(name)
        .unwrap_or_else(|| panic!("grammar should know `{name}`"))
}

/// Assert the round-trip law: leaf texts concatenated in order reproduce
/// the source exactly.
pub fn assert_round_trip(tree: &Tree, source: &str) {
    assert_eq!(tree.text(), source, "tree must cover every input byte");
}

/// Assert that two trees have identical structure, dumping both on failure.
pub fn assert_same_shape(a: &Tree, b: &Tree) {
    assert!(
        a.structurally_eq(b),
        "trees differ structurally:\n--- left ---\n{}\n--- right ---\n{}",
        a.debug_dump(),
        b.debug_dump(),
    );
}

/// All descendant nodes of the given kind.
pub fn nodes_of_kind(root: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxNode> {
    root.descendants().filter(|n| n.kind() == kind).collect()
}

/// True if the subtree contains an error node.
pub fn has_error_node(node: &SyntaxNode) -> bool {
    node.descendants().any(|n| n.kind() == SyntaxKind::ERROR)
}
