//! Grammar-driven lexer built on logos.
//!
//! Logos handles the fixed lexical shapes every grammar shares (trivia,
//! identifiers, literals, single punctuation characters); the wrapper then
//! applies the grammar's dynamic vocabulary:
//!
//! - identifier text is matched against the keyword table, keywords win
//! - adjacent punctuation is combined against the operator table, longest
//!   declared operator first (maximal munch)
//! - non-ASCII identifiers fall through logos and are classified with
//!   `unicode-ident`
//!
//! Anything that still does not classify becomes an [`SyntaxKind::UNKNOWN`]
//! token covering the offending bytes, so lexing never fails and every byte
//! of input lands in exactly one token. The lexer restarts from any byte
//! offset, which incremental reparsing uses to re-lex only a damaged slice.

use logos::Logos;
use text_size::TextSize;

use crate::grammar::Grammar;
use crate::syntax::SyntaxKind;

/// A token with its kind, text, and absolute position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn range(&self) -> text_size::TextRange {
        text_size::TextRange::at(self.offset, TextSize::of(self.text))
    }
}

/// Lexer wrapping the logos-generated scanner
pub struct Lexer<'a> {
    grammar: &'a Grammar,
    inner: logos::Lexer<'a, RawToken>,
    base: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(grammar: &'a Grammar, input: &'a str) -> Self {
        Self::with_offset(grammar, input, TextSize::new(0))
    }

    /// Start lexing at `offset` (a char boundary) into `input`. Tokens carry
    /// absolute offsets.
    pub fn with_offset(grammar: &'a Grammar, input: &'a str, offset: TextSize) -> Self {
        let base = u32::from(offset);
        Self {
            grammar,
            inner: RawToken::lexer(&input[base as usize..]),
            base,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.inner.next()?;
        let span = self.inner.span();
        let offset = TextSize::new(self.base + span.start as u32);

        let kind = match raw {
            Ok(RawToken::Whitespace) => SyntaxKind::WHITESPACE,
            Ok(RawToken::LineComment) => SyntaxKind::LINE_COMMENT,
            Ok(RawToken::BlockComment) => SyntaxKind::BLOCK_COMMENT,
            Ok(RawToken::UnterminatedBlockComment) => SyntaxKind::UNKNOWN,
            Ok(RawToken::Ident) => {
                // The scanner's pattern is ASCII; pull in any non-ASCII
                // identifier continuation before the keyword lookup.
                let extra: usize = self
                    .inner
                    .remainder()
                    .chars()
                    .take_while(|&c| unicode_ident::is_xid_continue(c))
                    .map(char::len_utf8)
                    .sum();
                self.inner.bump(extra);
                // Keywords win over plain identifiers.
                match self.grammar.keyword_kind(self.inner.slice()) {
                    Some(kw) => kw,
                    None => SyntaxKind::IDENT,
                }
            }
            Ok(RawToken::Int) => SyntaxKind::INT,
            Ok(RawToken::Float) => SyntaxKind::FLOAT,
            Ok(RawToken::String) => SyntaxKind::STRING,
            Ok(RawToken::UnterminatedString) => SyntaxKind::UNKNOWN,
            Ok(RawToken::Char) => SyntaxKind::CHAR,
            Ok(RawToken::Punct) => {
                // Maximal munch against the grammar's operator table; the
                // longest declared operator starting here wins.
                match self.grammar.munch_operator(self.inner.remainder_with_slice()) {
                    Some((kind, len)) => {
                        debug_assert!(len >= self.inner.slice().len());
                        self.inner.bump(len - self.inner.slice().len());
                        kind
                    }
                    None => SyntaxKind::UNKNOWN,
                }
            }
            Err(()) => {
                // Non-ASCII identifier start, or genuinely unclassifiable
                // input.
                let first = self.inner.slice().chars().next();
                if first.is_some_and(unicode_ident::is_xid_start) {
                    let extra: usize = self
                        .inner
                        .remainder()
                        .chars()
                        .take_while(|&c| unicode_ident::is_xid_continue(c))
                        .map(char::len_utf8)
                        .sum();
                    self.inner.bump(extra);
                    match self.grammar.keyword_kind(self.inner.slice()) {
                        Some(kw) => kw,
                        None => SyntaxKind::IDENT,
                    }
                } else {
                    SyntaxKind::UNKNOWN
                }
            }
        };

        Some(Token {
            kind,
            text: self.inner.slice(),
            offset,
        })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize<'a>(grammar: &'a Grammar, input: &'a str) -> Vec<Token<'a>> {
    Lexer::new(grammar, input).collect()
}

trait RemainderWithSlice<'a> {
    /// The current slice plus everything after it, for prefix matching that
    /// may extend past the current token.
    fn remainder_with_slice(&self) -> &'a str;
}

impl<'a> RemainderWithSlice<'a> for logos::Lexer<'a, RawToken> {
    fn remainder_with_slice(&self) -> &'a str {
        &self.source()[self.span().start..]
    }
}

/// Raw lexical shapes shared by every grammar. Single punctuation
/// characters are emitted one at a time and combined by the wrapper.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub(crate) enum RawToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", priority = 10)]
    BlockComment,

    #[regex(r"/\*([^*]|\*[^/])*\*?", priority = 6)]
    UnterminatedBlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*", priority = 4)]
    #[regex(r"0[xob][0-9a-fA-F_]+", priority = 5)]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", priority = 6)]
    Float,

    #[regex(r#""([^"\\\n]|\\.)*""#, priority = 10)]
    String,

    #[regex(r#""([^"\\\n]|\\.)*"#, priority = 6)]
    UnterminatedString,

    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    // =========================================================================
    // PUNCTUATION (single characters; the wrapper munches operators)
    // =========================================================================
    #[regex(r"[!#-&(-/:-@\[-\^`{-~]")]
    Punct,
}
