//! Grammar tables: the static, read-only description of a language that
//! drives every parse.
//!
//! A [`Grammar`] is constructed once, up front, through [`GrammarBuilder`]
//! (or loaded from a JSON data artifact with the `artifact` feature) and
//! then shared by reference: `build()` assigns [`SyntaxKind`] values to the
//! grammar's keywords, operators, and nonterminals, validates the
//! declaration, and compiles the SLR(1) action/goto tables the parser engine
//! executes. Malformed declarations are programmer-facing, fatal
//! [`GrammarError`]s at load time; nothing here ever fails on user input.

mod builder;
mod registry;
pub(crate) mod table;

#[cfg(feature = "artifact")]
mod artifact;

#[cfg(feature = "artifact")]
pub use artifact::{
    AssocSpec, FORMAT_VERSION, GrammarSpec, PrecedenceSpec, RecoverySpec, RuleSpec, load_grammar,
};
pub use builder::{Assoc, GrammarBuilder, SymbolRef};
pub use registry::GrammarRegistry;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::syntax::SyntaxKind;

use table::ParseTable;

/// Fatal, programmer-facing errors raised while building or loading a
/// grammar. User-input problems are never reported this way; they become
/// error nodes in the parsed tree.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("grammar `{0}` declares no productions")]
    Empty(SmolStr),
    #[error("`{0}` is not a valid keyword")]
    InvalidKeyword(SmolStr),
    #[error("`{0}` is not a valid operator")]
    InvalidOperator(SmolStr),
    #[error("`{0}` is not a valid nonterminal name")]
    InvalidNonterminal(SmolStr),
    #[error("production left-hand side `{0}` is not a nonterminal")]
    TerminalOnLeft(SmolStr),
    #[error("nonterminal `{0}` has no productions")]
    MissingProductions(SmolStr),
    #[error("grammar has no start symbol")]
    MissingStart,
    #[error("start symbol `{0}` must be a visible nonterminal")]
    InvalidStart(SmolStr),
    #[error("recovery point `{0}` must be a visible nonterminal with terminal terminators")]
    InvalidRecovery(SmolStr),
    #[error("`{0}` has no declared precedence level")]
    UndeclaredPrecedence(SmolStr),
    #[error("precedence levels apply to terminals, `{0}` is a nonterminal")]
    NonterminalPrecedence(SmolStr),
    #[error("unknown symbol `{0}` referenced by grammar artifact")]
    UnknownSymbol(String),
    #[error("unsupported grammar artifact format version {found} (expected {expected})")]
    FormatVersion { found: u32, expected: u32 },
    #[cfg(feature = "artifact")]
    #[error("malformed grammar artifact: {0}")]
    Artifact(#[from] serde_json::Error),
}

/// A single production rule. `hidden` mirrors the left-hand nonterminal's
/// visibility: hidden nonterminals (leading `_` in the name) reduce without
/// emitting a node.
#[derive(Debug, Clone)]
pub(crate) struct Production {
    pub(crate) lhs: SyntaxKind,
    pub(crate) rhs: Box<[SyntaxKind]>,
    pub(crate) hidden: bool,
}

/// Per-nonterminal recovery declaration: the tokens that may close this
/// construct. Recovery nonterminals double as incremental reparse
/// boundaries.
#[derive(Debug, Clone)]
pub struct RecoveryInfo {
    pub terminators: Box<[SyntaxKind]>,
}

/// A compiled, immutable grammar table.
///
/// Shared by reference (`Arc`) between every parse that uses it; the parser
/// engine only ever reads it, so no locking is involved.
pub struct Grammar {
    name: SmolStr,
    version: u32,
    start: SyntaxKind,
    /// Names of dynamic kinds, indexed by `raw - FIRST_DYNAMIC`.
    kind_names: Vec<SmolStr>,
    keyword_count: u16,
    operator_count: u16,
    keywords: FxHashMap<SmolStr, SyntaxKind>,
    /// Operators sorted longest-first for maximal munch.
    operators: Vec<(SmolStr, SyntaxKind)>,
    recovery: FxHashMap<SyntaxKind, RecoveryInfo>,
    pub(crate) productions: Vec<Production>,
    pub(crate) table: ParseTable,
}

impl Grammar {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: SmolStr,
        version: u32,
        start: SyntaxKind,
        kind_names: Vec<SmolStr>,
        keyword_count: u16,
        operator_count: u16,
        keywords: FxHashMap<SmolStr, SyntaxKind>,
        operators: Vec<(SmolStr, SyntaxKind)>,
        recovery: FxHashMap<SyntaxKind, RecoveryInfo>,
        productions: Vec<Production>,
        table: ParseTable,
    ) -> Grammar {
        Grammar {
            name,
            version,
            start,
            kind_names,
            keyword_count,
            operator_count,
            keywords,
            operators,
            recovery,
            productions,
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The start nonterminal's kind.
    pub fn start_kind(&self) -> SyntaxKind {
        self.start
    }

    /// Resolve a kind to its name: reserved kinds have fixed names, dynamic
    /// kinds are named by the grammar declaration.
    pub fn kind_name(&self, kind: SyntaxKind) -> &str {
        if let Some(name) = kind.reserved_name() {
            return name;
        }
        self.kind_names
            .get((kind.0 - SyntaxKind::FIRST_DYNAMIC) as usize)
            .map(SmolStr::as_str)
            .unwrap_or("<unknown kind>")
    }

    /// Look a kind up by name. Nonterminals shadow keywords, which shadow
    /// operators and the reserved kinds.
    pub fn kind_by_name(&self, name: &str) -> Option<SyntaxKind> {
        let nt_base = SyntaxKind::FIRST_DYNAMIC + self.keyword_count + self.operator_count;
        let nts = &self.kind_names[(nt_base - SyntaxKind::FIRST_DYNAMIC) as usize..];
        if let Some(i) = nts.iter().position(|n| n == name) {
            return Some(SyntaxKind(nt_base + i as u16));
        }
        if let Some(&kind) = self.keywords.get(name) {
            return Some(kind);
        }
        if let Some((_, kind)) = self.operators.iter().find(|(text, _)| text == name) {
            return Some(*kind);
        }
        RESERVED_BY_NAME
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, k)| k)
    }

    pub fn is_keyword(&self, kind: SyntaxKind) -> bool {
        let base = SyntaxKind::FIRST_DYNAMIC;
        kind.0 >= base && kind.0 < base + self.keyword_count
    }

    pub fn is_operator(&self, kind: SyntaxKind) -> bool {
        let base = SyntaxKind::FIRST_DYNAMIC + self.keyword_count;
        kind.0 >= base && kind.0 < base + self.operator_count
    }

    pub fn is_nonterminal(&self, kind: SyntaxKind) -> bool {
        let base = SyntaxKind::FIRST_DYNAMIC + self.keyword_count + self.operator_count;
        kind.0 >= base && (kind.0 - SyntaxKind::FIRST_DYNAMIC) < self.kind_names.len() as u16
    }

    /// Hidden nonterminals reduce without emitting a node.
    pub fn is_hidden(&self, kind: SyntaxKind) -> bool {
        self.is_nonterminal(kind) && self.kind_name(kind).starts_with('_')
    }

    /// Recovery declaration for a nonterminal, if it is a recovery point.
    pub fn recovery_info(&self, kind: SyntaxKind) -> Option<&RecoveryInfo> {
        self.recovery.get(&kind)
    }

    /// Keyword kind for an identifier-shaped token, per the grammar's
    /// keyword table.
    pub(crate) fn keyword_kind(&self, text: &str) -> Option<SyntaxKind> {
        self.keywords.get(text).copied()
    }

    /// Longest declared operator that prefixes `rest`, with its byte length.
    pub(crate) fn munch_operator(&self, rest: &str) -> Option<(SyntaxKind, usize)> {
        self.operators
            .iter()
            .find(|(text, _)| rest.starts_with(text.as_str()))
            .map(|(text, kind)| (*kind, text.len()))
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("start", &self.kind_name(self.start))
            .field("productions", &self.productions.len())
            .field("states", &self.table.state_count())
            .finish()
    }
}

const RESERVED_BY_NAME: &[(&str, SyntaxKind)] = &[
    ("whitespace", SyntaxKind::WHITESPACE),
    ("line_comment", SyntaxKind::LINE_COMMENT),
    ("block_comment", SyntaxKind::BLOCK_COMMENT),
    ("ident", SyntaxKind::IDENT),
    ("int", SyntaxKind::INT),
    ("float", SyntaxKind::FLOAT),
    ("string", SyntaxKind::STRING),
    ("char", SyntaxKind::CHAR),
    ("unknown", SyntaxKind::UNKNOWN),
    ("eof", SyntaxKind::EOF),
    ("error", SyntaxKind::ERROR),
    ("root", SyntaxKind::ROOT),
];
