//! Syntax tree surface: kinds, the published tree handle, cursor
//! navigation, and edit descriptors.
//!
//! The tree substrate is rowan's green/red design: green nodes are
//! position-independent and deduplicated, red nodes ([`SyntaxNode`]) carry
//! absolute offsets and parent pointers and are materialized on demand
//! during traversal. Everything here is read-only; producing a changed tree
//! goes through [`crate::parser::reparse`].

mod cursor;
mod edit;
mod kind;
mod tree;

pub use cursor::Cursor;
pub use edit::Edit;
pub use kind::{
    SylvaLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxNodeChildren, SyntaxToken,
};
pub use tree::Tree;
