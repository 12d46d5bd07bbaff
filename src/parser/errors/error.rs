//! Syntax error diagnostics.
//!
//! Malformed input never aborts a parse; it is reported as a list of
//! [`SyntaxError`]s alongside the tree, each covering exactly the byte
//! range that failed to parse cleanly so a host can render
//! squiggly-underline style reports.

use text_size::{TextRange, TextSize};

use super::codes::ErrorCode;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// A hard error that prevented a clean parse
    #[default]
    Error,
    /// A problem worth reporting that did not produce an error node
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// A diagnostic produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Human-readable error message
    pub message: String,
    /// Source location
    pub range: TextRange,
    /// Categorized error code
    pub code: ErrorCode,
    /// Error severity
    pub severity: Severity,
    /// Optional suggestion for fixing the error
    pub hint: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            range,
            code,
            severity: Severity::Error,
            hint: None,
        }
    }

    /// Create an error at a specific offset with a zero-width range
    pub fn at_offset(message: impl Into<String>, offset: TextSize, code: ErrorCode) -> Self {
        Self::new(message, TextRange::empty(offset), code)
    }

    /// Create an error with the code's default message
    pub fn from_code(range: TextRange, code: ErrorCode) -> Self {
        Self::new(code.default_message(), range, code)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn has_hint(&self) -> bool {
        self.hint.is_some()
    }

    /// Shift this error's range by a signed byte delta. Used when splicing
    /// diagnostics across an incremental reparse.
    pub(crate) fn shifted(mut self, delta: i64) -> Self {
        let start = (i64::from(u32::from(self.range.start())) + delta).max(0) as u32;
        let end = (i64::from(u32::from(self.range.end())) + delta).max(0) as u32;
        self.range = TextRange::new(TextSize::new(start), TextSize::new(end));
        self
    }

    /// Format the error for display
    pub fn format(&self) -> String {
        let mut result = format!("{}: {}", self.code, self.message);
        if let Some(hint) = &self.hint {
            result.push_str(&format!("\n  hint: {}", hint));
        }
        result
    }
}
