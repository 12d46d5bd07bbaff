//! # sylva
//!
//! Incremental, error-tolerant parsing library producing lossless syntax
//! trees from table-driven grammars.
//!
//! A host supplies a [`Grammar`] (built through [`GrammarBuilder`] or, with
//! the `artifact` feature, loaded from a JSON data artifact) and raw source
//! text; sylva returns an immutable [`Tree`] that covers every byte of the
//! input, malformed or not. Edits are applied with [`reparse`], which reuses
//! unaffected subtrees and produces a tree structurally identical to parsing
//! the new text from scratch.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! syntax    → Tree handle, cursor, SyntaxKind, Edit
//!   ↓
//! parser    → Logos lexer, LR engine, error recovery, incremental reparse
//!   ↓
//! grammar   → Grammar builder, table construction, registry
//!   ↓
//! base      → Primitives (LineIndex, LineCol, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → parser → syntax)
// ============================================================================

/// Foundation types: LineIndex, LineCol, TextRange re-exports
pub mod base;

/// Grammar tables: builder, SLR(1) construction, registry, artifacts
pub mod grammar;

/// Parser: Logos lexer, shift-reduce engine, recovery, incremental reparse
pub mod parser;

/// Syntax: Tree handle, cursor navigation, SyntaxKind, Edit descriptor
pub mod syntax;

// Re-export the public surface at the crate root
pub use base::{LineCol, LineIndex};
pub use grammar::{Assoc, Grammar, GrammarBuilder, GrammarError, GrammarRegistry, SymbolRef};
pub use parser::errors::{ErrorCode, Severity, SyntaxError};
pub use parser::{Lexer, Token, parse, parse_batch, parse_with_cancellation, reparse};
pub use syntax::{
    Cursor, Edit, SylvaLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, Tree,
};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
