//! Table-driven incremental parser.
//!
//! This module provides a lossless, incremental parser using:
//! - **logos** for fast lexing
//! - **rowan** for the CST (Concrete Syntax Tree)
//!
//! This is the rust-analyzer approach: we build a lossless CST that
//! preserves all whitespace and comments, driven here by SLR(1) tables
//! compiled from the host's grammar instead of a hand-written grammar
//! module.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos + grammar vocabulary) → Tokens with SyntaxKind
//!     ↓
//! Engine (shift-reduce over the grammar table) → GreenNode tree
//!     ↓
//! Tree (rowan) → CST handle with cursor API
//! ```
//!
//! ## Incremental Reparsing
//!
//! When text changes, we:
//! 1. Find the smallest recovery-point subtree containing the change
//! 2. Reparse only that subtree, from its own table entry state
//! 3. Reuse every green node outside it (they're immutable and cheap to
//!    share), falling back to a full parse whenever a safety check fails
//!
//! ## Error handling
//!
//! Malformed input never fails a parse. The engine inserts zero-width
//! synthetic tokens or skips input into `ERROR` nodes until it
//! resynchronizes at a grammar-declared recovery point, and always returns
//! a tree covering every input byte.

pub mod errors;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;
mod reparse;

pub use lexer::{Lexer, Token, tokenize};
pub use parser::{parse, parse_batch, parse_with_cancellation};
pub use reparse::reparse;
