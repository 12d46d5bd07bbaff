//! Syntax kinds for the rowan-based CST.
//!
//! Unlike a fixed-language parser, sylva serves whatever grammar the host
//! loads, so [`SyntaxKind`] is a thin `u16` newtype rather than a closed
//! enum. A small band of low values is reserved for the lexical and
//! structural kinds every grammar shares; everything above
//! [`SyntaxKind::FIRST_DYNAMIC`] is assigned by the grammar table at build
//! time (keywords first, then operators, then nonterminals). Kind names are
//! resolved through [`crate::grammar::Grammar::kind_name`].

/// A token or node kind in the syntax tree.
///
/// Tokens are leaves (identifiers, keywords, punctuation, trivia); nodes are
/// composite (one per visible grammar nonterminal, plus [`SyntaxKind::ERROR`]
/// and the [`SyntaxKind::ROOT`] wrapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
    // =========================================================================
    // TRIVIA (preserved in the tree, invisible to the parse tables)
    // =========================================================================
    pub const WHITESPACE: SyntaxKind = SyntaxKind(0);
    pub const LINE_COMMENT: SyntaxKind = SyntaxKind(1);
    pub const BLOCK_COMMENT: SyntaxKind = SyntaxKind(2);

    // =========================================================================
    // LITERAL CLASSES (shared by every grammar)
    // =========================================================================
    pub const IDENT: SyntaxKind = SyntaxKind(3);
    pub const INT: SyntaxKind = SyntaxKind(4);
    pub const FLOAT: SyntaxKind = SyntaxKind(5);
    pub const STRING: SyntaxKind = SyntaxKind(6);
    pub const CHAR: SyntaxKind = SyntaxKind(7);

    // =========================================================================
    // STRUCTURAL KINDS
    // =========================================================================
    /// Byte sequence the lexer could not classify. Never enters the LR stack.
    pub const UNKNOWN: SyntaxKind = SyntaxKind(8);
    /// End-of-input sentinel. Appears in parse tables, never in the tree.
    pub const EOF: SyntaxKind = SyntaxKind(9);
    /// Error node wrapping skipped or synthesized material.
    pub const ERROR: SyntaxKind = SyntaxKind(10);
    /// Tree root. Covers the entire source including leading/trailing trivia.
    pub const ROOT: SyntaxKind = SyntaxKind(11);

    /// First kind value available for grammar-assigned symbols.
    pub const FIRST_DYNAMIC: u16 = 12;

    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT
        )
    }

    /// Check if this is one of the reserved literal classes
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::IDENT | Self::INT | Self::FLOAT | Self::STRING | Self::CHAR
        )
    }

    /// Check if this kind is reserved rather than grammar-assigned
    pub fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    /// Name of a reserved kind; dynamic kinds are named by the grammar.
    pub(crate) fn reserved_name(self) -> Option<&'static str> {
        Some(match self {
            Self::WHITESPACE => "whitespace",
            Self::LINE_COMMENT => "line_comment",
            Self::BLOCK_COMMENT => "block_comment",
            Self::IDENT => "ident",
            Self::INT => "int",
            Self::FLOAT => "float",
            Self::STRING => "string",
            Self::CHAR => "char",
            Self::UNKNOWN => "unknown",
            Self::EOF => "eof",
            Self::ERROR => "error",
            Self::ROOT => "root",
            _ => return None,
        })
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind.0)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        Self(raw.0)
    }
}

/// Language definition for rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SylvaLanguage {}

impl rowan::Language for SylvaLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<SylvaLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<SylvaLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<SylvaLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<SylvaLanguage>;
