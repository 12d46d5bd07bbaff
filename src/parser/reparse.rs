//! Incremental reparsing.
//!
//! `reparse` produces a tree for the edited text that is structurally
//! identical to a full parse, reusing unaffected green subtrees. The fast
//! path reparses only the smallest recovery-point subtree around the edit;
//! green nodes store lengths rather than absolute offsets, so everything to
//! the right of the splice shifts implicitly and everything outside it is
//! shared with the old tree untouched.
//!
//! The fast path is taken only when a chain of safety checks passes:
//!
//! - the edit lies strictly inside a recovery-point node that was clean
//!   (no diagnostics) and ends in one of its declared terminator tokens
//! - the fragment parse of the edited slice is clean, yields exactly that
//!   node kind covering the whole slice, and still ends in a terminator
//! - re-lexing across both splice boundaries reproduces the old token
//!   seams, so no token can merge across the splice
//!
//! Any failed check falls back to a full parse, which preserves the
//! incremental/batch equivalence guarantee unconditionally. Terminator
//! tokens are required because a construct that ends in a closing delimiter
//! parses the same with or without right context; recovery points that can
//! end mid-expression would not be safe boundaries.

use rowan::NodeOrToken;
use text_size::{TextRange, TextSize};

use crate::syntax::{Edit, SyntaxKind, SyntaxNode, Tree};

use super::lexer::Lexer;
use super::parser::{parse, parse_fragment};

/// Reparse after an edit. Equivalent to `parse(tree.grammar(), new_text)`,
/// but reuses unaffected subtrees of `tree` when it can prove the result
/// identical.
pub fn reparse(tree: &Tree, edit: &Edit, new_text: &str) -> Tree {
    if let Some(result) = try_incremental(tree, edit, new_text) {
        tracing::debug!(grammar = tree.grammar().name(), "incremental reparse hit");
        return result;
    }
    tracing::debug!(
        grammar = tree.grammar().name(),
        "incremental reparse fell back to a full parse"
    );
    parse(tree.grammar(), new_text)
}

fn try_incremental(tree: &Tree, edit: &Edit, new_text: &str) -> Option<Tree> {
    // A cancelled tree is partial; its shapes are not trustworthy anchors.
    if tree.is_cancelled() {
        return None;
    }
    // Malformed edit descriptors go down the safe path.
    if edit.start > edit.old_end
        || edit.old_end > tree.source_len()
        || edit.new_end > TextSize::of(new_text)
    {
        return None;
    }

    let root = tree.root();
    let mut node = match root.covering_element(edit.old_range()) {
        NodeOrToken::Node(node) => node,
        NodeOrToken::Token(token) => token.parent()?,
    };
    loop {
        if let Some(result) = reparse_node(tree, &node, edit, new_text) {
            return Some(result);
        }
        node = node.parent()?;
    }
}

fn reparse_node(tree: &Tree, node: &SyntaxNode, edit: &Edit, new_text: &str) -> Option<Tree> {
    let grammar = tree.grammar();
    let info = grammar.recovery_info(node.kind())?;
    let range = node.text_range();

    // The edit must sit strictly inside the node: both boundary characters
    // stay untouched, so the splice seams exist in the new text too.
    if !(range.start() < edit.start && edit.old_end < range.end()) {
        return None;
    }
    // Only clean subtrees are safe anchors; recovery shapes depend on
    // context outside the node.
    if tree
        .errors()
        .iter()
        .any(|e| e.range.intersect(range).is_some())
    {
        return None;
    }
    // The construct must still be closed by one of its terminators.
    let old_last = node.last_token()?;
    if !info.terminators.contains(&old_last.kind()) {
        return None;
    }

    let new_node_end = edit.map_offset_after(range.end());
    let slice = new_text.get(usize::from(range.start())..usize::from(new_node_end))?;

    let fragment = parse_fragment(grammar, slice, node.kind())?;
    if fragment.cancelled || !fragment.errors.is_empty() {
        return None;
    }
    let fragment_root = SyntaxNode::new_root(fragment.green);
    let mut children = fragment_root.children_with_tokens();
    let child = children.next()?.into_node()?;
    if children.next().is_some() {
        return None;
    }
    if child.kind() != node.kind()
        || child.text_range() != TextRange::new(TextSize::new(0), TextSize::of(slice))
    {
        return None;
    }
    let new_last = child.last_token()?;
    if !info.terminators.contains(&new_last.kind()) {
        return None;
    }

    // Lexical seams: a token adjacent to the splice must not merge with
    // material on the other side of it.
    if !left_seam_intact(tree, node, new_text) {
        return None;
    }
    let new_last_start = range.start() + new_last.text_range().start();
    if !seam_token_ends_at(tree, new_text, new_last_start, new_node_end, new_last.kind()) {
        return None;
    }

    let green = node.replace_with(child.green().into_owned());
    let delta = edit.delta();
    let errors = tree
        .errors()
        .iter()
        .map(|e| {
            if e.range.start() >= range.end() {
                e.clone().shifted(delta)
            } else {
                e.clone()
            }
        })
        .collect();
    Some(Tree::new(
        grammar.clone(),
        green,
        errors,
        false,
        TextSize::of(new_text),
    ))
}

/// The token immediately before the node must still end exactly at the
/// node's start when re-lexed over the new text.
fn left_seam_intact(tree: &Tree, node: &SyntaxNode, new_text: &str) -> bool {
    let Some(prev) = node.first_token().and_then(|t| t.prev_token()) else {
        // Node starts the file; nothing can merge into it from the left.
        return true;
    };
    let start = prev.text_range().start();
    seam_token_ends_at(tree, new_text, start, node.text_range().start(), prev.kind())
}

/// Re-lex `new_text` from `start` and require the first token to end at
/// `end` with the expected kind.
fn seam_token_ends_at(
    tree: &Tree,
    new_text: &str,
    start: TextSize,
    end: TextSize,
    kind: SyntaxKind,
) -> bool {
    if usize::from(start) > new_text.len() || !new_text.is_char_boundary(usize::from(start)) {
        return false;
    }
    let mut lexer = Lexer::with_offset(tree.grammar(), new_text, start);
    match lexer.next() {
        Some(token) => token.range().end() == end && token.kind == kind,
        None => false,
    }
}
