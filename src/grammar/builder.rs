//! Declarative grammar construction.
//!
//! Hosts declare symbols, productions, precedence levels, and recovery
//! points through [`GrammarBuilder`]; [`GrammarBuilder::build`] validates
//! the declaration and compiles the parse tables. Nonterminals whose name
//! starts with `_` are hidden: they parse normally but emit no node,
//! keeping helper rules out of the published tree.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::syntax::SyntaxKind;

use super::table::{self, ProdPrec};
use super::{Grammar, GrammarError, Production, RecoveryInfo};

/// Operator associativity for a precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// Opaque handle to a symbol declared on a [`GrammarBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolRef(Sym);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Sym {
    Reserved(SyntaxKind),
    Keyword(u32),
    Operator(u32),
    Nonterminal(u32),
}

#[derive(Debug)]
struct ProdDecl {
    lhs: Sym,
    rhs: Vec<Sym>,
    prec: Option<Sym>,
}

/// Builder for [`Grammar`] tables.
#[derive(Debug)]
pub struct GrammarBuilder {
    name: SmolStr,
    version: u32,
    keywords: IndexMap<SmolStr, ()>,
    operators: IndexMap<SmolStr, ()>,
    nonterminals: IndexMap<SmolStr, ()>,
    /// Precedence levels in declaration order; later levels bind tighter.
    prec_levels: Vec<(Assoc, Vec<Sym>)>,
    productions: Vec<ProdDecl>,
    recovery: Vec<(Sym, Vec<Sym>)>,
    start: Option<Sym>,
}

impl GrammarBuilder {
    pub fn new(name: &str, version: u32) -> GrammarBuilder {
        GrammarBuilder {
            name: SmolStr::new(name),
            version,
            keywords: IndexMap::new(),
            operators: IndexMap::new(),
            nonterminals: IndexMap::new(),
            prec_levels: Vec::new(),
            productions: Vec::new(),
            recovery: Vec::new(),
            start: None,
        }
    }

    // =========================================================================
    // Reserved terminal classes
    // =========================================================================

    pub fn ident(&self) -> SymbolRef {
        SymbolRef(Sym::Reserved(SyntaxKind::IDENT))
    }

    pub fn int_literal(&self) -> SymbolRef {
        SymbolRef(Sym::Reserved(SyntaxKind::INT))
    }

    pub fn float_literal(&self) -> SymbolRef {
        SymbolRef(Sym::Reserved(SyntaxKind::FLOAT))
    }

    pub fn string_literal(&self) -> SymbolRef {
        SymbolRef(Sym::Reserved(SyntaxKind::STRING))
    }

    pub fn char_literal(&self) -> SymbolRef {
        SymbolRef(Sym::Reserved(SyntaxKind::CHAR))
    }

    // =========================================================================
    // Symbol declaration (idempotent; re-declaring returns the same handle)
    // =========================================================================

    /// Declare a keyword. Keywords win over plain identifiers in the lexer.
    pub fn keyword(&mut self, text: &str) -> SymbolRef {
        let entry = self.keywords.entry(SmolStr::new(text));
        let index = entry.index() as u32;
        entry.or_insert(());
        SymbolRef(Sym::Keyword(index))
    }

    /// Declare an operator or punctuation token. Longer operators win over
    /// shorter ones at the same position (maximal munch).
    pub fn operator(&mut self, text: &str) -> SymbolRef {
        let entry = self.operators.entry(SmolStr::new(text));
        let index = entry.index() as u32;
        entry.or_insert(());
        SymbolRef(Sym::Operator(index))
    }

    /// Declare a nonterminal. A leading `_` makes it hidden: its productions
    /// parse normally but no node is emitted for them.
    pub fn nonterminal(&mut self, name: &str) -> SymbolRef {
        let entry = self.nonterminals.entry(SmolStr::new(name));
        let index = entry.index() as u32;
        entry.or_insert(());
        SymbolRef(Sym::Nonterminal(index))
    }

    // =========================================================================
    // Grammar structure
    // =========================================================================

    /// Declare a precedence level for the given terminals. Each call binds
    /// tighter than the previous one (yacc's `%left`/`%right` ordering).
    pub fn precedence(&mut self, assoc: Assoc, terminals: &[SymbolRef]) {
        self.prec_levels
            .push((assoc, terminals.iter().map(|s| s.0).collect()));
    }

    /// Add a production `lhs → rhs`. An empty `rhs` declares an epsilon
    /// production.
    pub fn production(&mut self, lhs: SymbolRef, rhs: &[SymbolRef]) {
        self.productions.push(ProdDecl {
            lhs: lhs.0,
            rhs: rhs.iter().map(|s| s.0).collect(),
            prec: None,
        });
    }

    /// Add a production whose conflict-resolution precedence is taken from
    /// `prec` instead of its rightmost terminal.
    pub fn production_with_prec(&mut self, lhs: SymbolRef, rhs: &[SymbolRef], prec: SymbolRef) {
        self.productions.push(ProdDecl {
            lhs: lhs.0,
            rhs: rhs.iter().map(|s| s.0).collect(),
            prec: Some(prec.0),
        });
    }

    /// Mark a nonterminal as a recovery point closed by the given terminator
    /// tokens. Recovery points anchor error resynchronization and double as
    /// incremental reparse boundaries.
    pub fn recover_at(&mut self, nonterminal: SymbolRef, terminators: &[SymbolRef]) {
        self.recovery
            .push((nonterminal.0, terminators.iter().map(|s| s.0).collect()));
    }

    /// Set the start nonterminal.
    pub fn start(&mut self, nonterminal: SymbolRef) {
        self.start = Some(nonterminal.0);
    }

    // =========================================================================
    // Validation and table construction
    // =========================================================================

    /// Validate the declaration and compile the SLR(1) tables.
    pub fn build(self) -> Result<Arc<Grammar>, GrammarError> {
        if self.productions.is_empty() {
            return Err(GrammarError::Empty(self.name));
        }

        for text in self.keywords.keys() {
            if !is_keyword_shaped(text) {
                return Err(GrammarError::InvalidKeyword(text.clone()));
            }
        }
        for text in self.operators.keys() {
            if text.is_empty() || !text.chars().all(is_operator_char) {
                return Err(GrammarError::InvalidOperator(text.clone()));
            }
        }
        for name in self.nonterminals.keys() {
            if !is_nonterminal_shaped(name) {
                return Err(GrammarError::InvalidNonterminal(name.clone()));
            }
        }

        // Kind assignment: keywords, then operators, then nonterminals.
        let keyword_count = self.keywords.len() as u16;
        let operator_count = self.operators.len() as u16;
        let kw_base = SyntaxKind::FIRST_DYNAMIC;
        let op_base = kw_base + keyword_count;
        let nt_base = op_base + operator_count;

        let mut kind_names: Vec<SmolStr> = Vec::new();
        kind_names.extend(self.keywords.keys().cloned());
        kind_names.extend(self.operators.keys().cloned());
        kind_names.extend(self.nonterminals.keys().cloned());

        let resolve = |sym: Sym| -> SyntaxKind {
            match sym {
                Sym::Reserved(kind) => kind,
                Sym::Keyword(i) => SyntaxKind(kw_base + i as u16),
                Sym::Operator(i) => SyntaxKind(op_base + i as u16),
                Sym::Nonterminal(i) => SyntaxKind(nt_base + i as u16),
            }
        };
        let name_of = |sym: Sym| -> SmolStr {
            match sym {
                Sym::Reserved(kind) => SmolStr::new(kind.reserved_name().unwrap_or("<reserved>")),
                Sym::Keyword(i) => self.keywords.get_index(i as usize).unwrap().0.clone(),
                Sym::Operator(i) => self.operators.get_index(i as usize).unwrap().0.clone(),
                Sym::Nonterminal(i) => self.nonterminals.get_index(i as usize).unwrap().0.clone(),
            }
        };
        let is_nt = |sym: Sym| matches!(sym, Sym::Nonterminal(_));
        let is_hidden_nt = |sym: Sym| match sym {
            Sym::Nonterminal(i) => self
                .nonterminals
                .get_index(i as usize)
                .is_some_and(|(name, _)| name.starts_with('_')),
            _ => false,
        };

        // Terminal precedence table from the declared levels. Level 0 means
        // "undeclared"; declared levels start at 1 and later ones bind
        // tighter.
        let mut term_prec: FxHashMap<SyntaxKind, (u32, Assoc)> = FxHashMap::default();
        for (level, (assoc, syms)) in self.prec_levels.iter().enumerate() {
            for &sym in syms {
                if is_nt(sym) {
                    return Err(GrammarError::NonterminalPrecedence(name_of(sym)));
                }
                term_prec.insert(resolve(sym), (level as u32 + 1, *assoc));
            }
        }

        // Productions, with per-production precedence for conflict
        // resolution: the explicit tag, or the rightmost terminal's level.
        let mut productions: Vec<Production> = Vec::with_capacity(self.productions.len());
        let mut prod_prec: Vec<ProdPrec> = Vec::with_capacity(self.productions.len());
        for decl in &self.productions {
            if !is_nt(decl.lhs) {
                return Err(GrammarError::TerminalOnLeft(name_of(decl.lhs)));
            }
            let prec = match decl.prec {
                Some(tag) => {
                    let Some(&level) = term_prec.get(&resolve(tag)) else {
                        return Err(GrammarError::UndeclaredPrecedence(name_of(tag)));
                    };
                    Some(level)
                }
                None => decl
                    .rhs
                    .iter()
                    .rev()
                    .find(|&&sym| !is_nt(sym))
                    .and_then(|&sym| term_prec.get(&resolve(sym)).copied()),
            };
            prod_prec.push(prec);
            productions.push(Production {
                lhs: resolve(decl.lhs),
                rhs: decl.rhs.iter().map(|&s| resolve(s)).collect(),
                hidden: is_hidden_nt(decl.lhs),
            });
        }

        // Every declared nonterminal needs at least one production.
        for (i, name) in self.nonterminals.keys().enumerate() {
            let kind = SyntaxKind(nt_base + i as u16);
            if !productions.iter().any(|p| p.lhs == kind) {
                return Err(GrammarError::MissingProductions(name.clone()));
            }
        }

        let start_sym = self.start.ok_or(GrammarError::MissingStart)?;
        if !is_nt(start_sym) || is_hidden_nt(start_sym) {
            return Err(GrammarError::InvalidStart(name_of(start_sym)));
        }
        let start = resolve(start_sym);

        let mut recovery: FxHashMap<SyntaxKind, RecoveryInfo> = FxHashMap::default();
        for (sym, terminators) in &self.recovery {
            if !is_nt(*sym) || is_hidden_nt(*sym) || terminators.is_empty() {
                return Err(GrammarError::InvalidRecovery(name_of(*sym)));
            }
            if let Some(bad) = terminators.iter().find(|&&t| is_nt(t)) {
                return Err(GrammarError::InvalidRecovery(name_of(*bad)));
            }
            recovery.insert(
                resolve(*sym),
                RecoveryInfo {
                    terminators: terminators.iter().map(|&t| resolve(t)).collect(),
                },
            );
        }

        // One parse entry point per start symbol: the grammar start plus
        // every recovery nonterminal (used by incremental reparse).
        let mut starts: Vec<SyntaxKind> = vec![start];
        for &kind in recovery.keys() {
            if !starts.contains(&kind) {
                starts.push(kind);
            }
        }
        starts[1..].sort_unstable();

        let display = {
            let kind_names = kind_names.clone();
            move |kind: SyntaxKind| -> SmolStr {
                if let Some(name) = kind.reserved_name() {
                    return SmolStr::new(name);
                }
                kind_names
                    .get((kind.0 - SyntaxKind::FIRST_DYNAMIC) as usize)
                    .cloned()
                    .unwrap_or_else(|| SmolStr::new("<unknown>"))
            }
        };

        let parse_table = table::build(&self.name, &productions, &starts, &term_prec, &prod_prec, &display);

        let keywords: FxHashMap<SmolStr, SyntaxKind> = self
            .keywords
            .keys()
            .enumerate()
            .map(|(i, text)| (text.clone(), SyntaxKind(kw_base + i as u16)))
            .collect();
        let mut operators: Vec<(SmolStr, SyntaxKind)> = self
            .operators
            .keys()
            .enumerate()
            .map(|(i, text)| (text.clone(), SyntaxKind(op_base + i as u16)))
            .collect();
        // Longest first so the lexer's prefix scan is maximal munch.
        operators.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        tracing::debug!(
            grammar = %self.name,
            version = self.version,
            productions = productions.len(),
            "compiled grammar tables"
        );

        Ok(Arc::new(Grammar::new(
            self.name,
            self.version,
            start,
            kind_names,
            keyword_count,
            operator_count,
            keywords,
            operators,
            recovery,
            productions,
            parse_table,
        )))
    }
}

/// Characters the lexer will consider when munching operators. Quotes and
/// underscore are excluded: they open literals and identifiers.
pub(crate) fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '!' | '#' | '$' | '%' | '&' | '(' | ')' | '*' | '+' | ',' | '-' | '.' | '/' | ':' | ';'
            | '<' | '=' | '>' | '?' | '@' | '[' | '\\' | ']' | '^' | '`' | '{' | '|' | '}' | '~'
    )
}

fn is_keyword_shaped(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || unicode_ident::is_xid_start(c) => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || unicode_ident::is_xid_continue(c))
}

fn is_nonterminal_shaped(name: &str) -> bool {
    // Same shape as keywords; leading underscores mark hidden rules.
    is_keyword_shaped(name)
}
