//! Stateful cursor over a published syntax tree.
//!
//! [`Cursor`] offers read-only navigation in the style editors expect:
//! parent, siblings, children, and offset-directed descent. Every movement
//! method returns `false` and leaves the cursor in place when the move is
//! impossible, so traversal loops stay simple.

use text_size::{TextRange, TextSize};

use super::kind::{SyntaxKind, SyntaxNode};

/// A read-only navigation cursor positioned on a node of the tree.
#[derive(Debug, Clone)]
pub struct Cursor {
    node: SyntaxNode,
}

impl Cursor {
    pub fn new(root: SyntaxNode) -> Self {
        Self { node: root }
    }

    /// The node the cursor currently points at.
    pub fn node(&self) -> &SyntaxNode {
        &self.node
    }

    pub fn kind(&self) -> SyntaxKind {
        self.node.kind()
    }

    pub fn range(&self) -> TextRange {
        self.node.text_range()
    }

    pub fn goto_parent(&mut self) -> bool {
        match self.node.parent() {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.node.first_child() {
            Some(child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    pub fn goto_last_child(&mut self) -> bool {
        match self.node.last_child() {
            Some(child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        match self.node.next_sibling() {
            Some(sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    pub fn goto_prev_sibling(&mut self) -> bool {
        match self.node.prev_sibling() {
            Some(sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    /// Move to the first child node whose range contains `offset`.
    pub fn goto_first_child_for_offset(&mut self, offset: TextSize) -> bool {
        let child = self
            .node
            .children()
            .find(|c| c.text_range().contains_inclusive(offset));
        match child {
            Some(child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    /// Descend to the smallest node containing `offset`.
    pub fn goto_smallest_for_offset(&mut self, offset: TextSize) -> bool {
        if !self.node.text_range().contains_inclusive(offset) {
            return false;
        }
        while self.goto_first_child_for_offset(offset) {}
        true
    }
}
