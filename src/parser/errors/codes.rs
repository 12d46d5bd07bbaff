//! Error code definitions for parser diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (unrecognized or unterminated input)
//! - E02xx: Syntax errors (tokens rejected by the parse tables)
//! - E03xx: Recovery errors (resynchronization failed)
//! - E04xx: Cancellation

use std::fmt;

/// Error codes for parser diagnostics
///
/// Each code represents a category of parse error, enabling filtering,
/// documentation, and IDE integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors
    // =========================================================================
    /// Unrecognized character or byte sequence
    E0101,
    /// Unterminated string literal
    E0102,
    /// Unterminated block comment
    E0103,

    // =========================================================================
    // E02xx: Syntax errors
    // =========================================================================
    /// Token rejected by the grammar table
    E0201,
    /// Missing token (a synthetic zero-width token was inserted)
    E0202,
    /// Unexpected end of input
    E0203,

    // =========================================================================
    // E03xx: Recovery errors
    // =========================================================================
    /// Could not resynchronize before end of input
    E0301,

    // =========================================================================
    // E04xx: Cancellation
    // =========================================================================
    /// Parse cancelled by the host; the tree is partial
    E0401,
}

impl ErrorCode {
    /// Default message for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "unrecognized character",
            Self::E0102 => "unterminated string literal",
            Self::E0103 => "unterminated block comment",
            Self::E0201 => "unexpected token",
            Self::E0202 => "missing token",
            Self::E0203 => "unexpected end of input",
            Self::E0301 => "could not recover from syntax errors",
            Self::E0401 => "parse cancelled",
        }
    }

    /// Check if this is a lexical error
    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::E0101 | Self::E0102 | Self::E0103)
    }

    /// Check if this is a syntax error
    pub fn is_syntactic(&self) -> bool {
        matches!(self, Self::E0201 | Self::E0202 | Self::E0203)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::E0101.to_string(), "E0101");
        assert_eq!(ErrorCode::E0301.to_string(), "E0301");
    }

    #[test]
    fn test_categories() {
        assert!(ErrorCode::E0102.is_lexical());
        assert!(!ErrorCode::E0102.is_syntactic());
        assert!(ErrorCode::E0201.is_syntactic());
        assert!(!ErrorCode::E0401.is_lexical());
    }
}
