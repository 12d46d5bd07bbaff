//! The published tree handle.
//!
//! A [`Tree`] is the immutable result of a parse: the green tree plus the
//! metadata a host needs (grammar handle and version, source length, the
//! diagnostics recorded while parsing, and whether the parse was cancelled).
//! Trees are cheap to clone and safe to share across threads; an edit never
//! mutates a published tree, it produces a new one.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rowan::{GreenNode, NodeOrToken};
use text_size::{TextRange, TextSize};

use crate::base::LineIndex;
use crate::grammar::Grammar;
use crate::parser::errors::SyntaxError;

use super::cursor::Cursor;
use super::kind::{SyntaxElement, SyntaxNode, SyntaxToken};

/// An immutable syntax tree over a single source text.
#[derive(Clone)]
pub struct Tree {
    grammar: Arc<Grammar>,
    green: GreenNode,
    errors: Arc<[SyntaxError]>,
    cancelled: bool,
    source_len: TextSize,
    line_index: Arc<OnceLock<Arc<LineIndex>>>,
}

impl Tree {
    pub(crate) fn new(
        grammar: Arc<Grammar>,
        green: GreenNode,
        errors: Vec<SyntaxError>,
        cancelled: bool,
        source_len: TextSize,
    ) -> Tree {
        Tree {
            grammar,
            green,
            errors: errors.into(),
            cancelled,
            source_len,
            line_index: Arc::new(OnceLock::new()),
        }
    }

    /// The root syntax node. Always [`crate::SyntaxKind::ROOT`], covering the
    /// entire source including leading and trailing trivia.
    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// The green tree this handle publishes.
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// The grammar this tree was parsed with.
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Grammar version recorded at parse time.
    pub fn grammar_version(&self) -> u32 {
        self.grammar.version()
    }

    /// Length of the source text this tree covers.
    pub fn source_len(&self) -> TextSize {
        self.source_len
    }

    /// Diagnostics recorded while parsing, in source order.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the parse was interrupted by a cancellation token. A cancelled
    /// tree still covers the whole source, with the unparsed tail marked as
    /// an error node.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Reconstruct the source text by concatenating leaf tokens in order.
    pub fn text(&self) -> String {
        self.root().text().to_string()
    }

    /// A cursor positioned at the root.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.root())
    }

    /// Line/column index for this tree's source, built lazily and cached.
    pub fn line_index(&self) -> Arc<LineIndex> {
        self.line_index
            .get_or_init(|| Arc::new(LineIndex::new(&self.text())))
            .clone()
    }

    /// The smallest node whose range contains `range`.
    pub fn covering_node(&self, range: TextRange) -> SyntaxNode {
        let root = self.root();
        if range.end() > root.text_range().end() {
            return root;
        }
        match root.covering_element(range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent().unwrap_or_else(|| self.root()),
        }
    }

    /// The smallest node containing `offset`.
    pub fn node_at_offset(&self, offset: TextSize) -> SyntaxNode {
        self.covering_node(TextRange::empty(offset.min(self.source_len)))
    }

    /// The token containing `offset`, if any. Between two tokens, the right
    /// one wins, matching how editors treat a caret position.
    pub fn token_at_offset(&self, offset: TextSize) -> Option<SyntaxToken> {
        if offset > self.source_len {
            return None;
        }
        self.root().token_at_offset(offset).right_biased()
    }

    /// Structural equality: same kinds, same shapes, same token texts.
    ///
    /// This is the comparison behind the incremental/batch equivalence
    /// guarantee; it ignores diagnostics and shared-memory identity.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        elements_eq(
            NodeOrToken::Node(self.root()),
            NodeOrToken::Node(other.root()),
        )
    }

    /// Render the tree with indentation, resolving kind names through the
    /// grammar. Intended for tests and debugging.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        self.dump_element(NodeOrToken::Node(self.root()), 0, &mut out);
        out
    }

    fn dump_element(&self, element: SyntaxElement, depth: usize, out: &mut String) {
        use fmt::Write;
        for _ in 0..depth {
            out.push_str("  ");
        }
        match element {
            NodeOrToken::Node(node) => {
                let range = node.text_range();
                let _ = writeln!(
                    out,
                    "{}@{}..{}",
                    self.grammar.kind_name(node.kind()),
                    u32::from(range.start()),
                    u32::from(range.end())
                );
                for child in node.children_with_tokens() {
                    self.dump_element(child, depth + 1, out);
                }
            }
            NodeOrToken::Token(token) => {
                let range = token.text_range();
                let _ = writeln!(
                    out,
                    "{}@{}..{} {:?}",
                    self.grammar.kind_name(token.kind()),
                    u32::from(range.start()),
                    u32::from(range.end()),
                    token.text()
                );
            }
        }
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("grammar", &self.grammar.name())
            .field("source_len", &self.source_len)
            .field("errors", &self.errors.len())
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

fn elements_eq(a: SyntaxElement, b: SyntaxElement) -> bool {
    match (a, b) {
        (NodeOrToken::Node(a), NodeOrToken::Node(b)) => {
            if a.kind() != b.kind() || a.text_range() != b.text_range() {
                return false;
            }
            let mut left = a.children_with_tokens();
            let mut right = b.children_with_tokens();
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return true,
                    (Some(l), Some(r)) => {
                        if !elements_eq(l, r) {
                            return false;
                        }
                    }
                    _ => return false,
                }
            }
        }
        (NodeOrToken::Token(a), NodeOrToken::Token(b)) => {
            a.kind() == b.kind() && a.text_range() == b.text_range() && a.text() == b.text()
        }
        _ => false,
    }
}
