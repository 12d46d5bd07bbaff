//! Parser diagnostics: error codes and the [`SyntaxError`] type.
//!
//! The taxonomy mirrors how errors surface to users:
//! - lexical (E01xx): bytes the lexer could not classify
//! - syntactic (E02xx): tokens the grammar table rejected
//! - recovery (E03xx): resynchronization ran out of input
//! - cancellation (E04xx): the host interrupted a parse
//!
//! None of these are fatal; they annotate the tree that is returned anyway.

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{Severity, SyntaxError};
