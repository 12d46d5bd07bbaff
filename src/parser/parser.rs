//! The shift-reduce engine.
//!
//! Executes the grammar's SLR(1) tables over the token stream and builds a
//! rowan green tree as it goes: a shift appends the token, a reduce wraps
//! everything since the checkpoint of the production's first symbol
//! (`start_node_at`), so only the `ROOT` wrapper is ever open and the
//! engine can stop anywhere — cancellation and recovery both rely on that.
//!
//! Trivia never enters the LR stack. Pending trivia is flushed into the
//! builder immediately before the next significant token, which pins every
//! node's span to its first and last significant tokens and lets leading
//! and trailing trivia float up to the enclosing node.
//!
//! Engine states: scanning for the next significant token, shifting,
//! reducing, recovering (insertion, then panic-mode skipping), accepted.
//! Malformed input is downgraded to `ERROR` nodes plus diagnostics; the
//! engine always returns a tree covering the entire input.

use std::sync::Arc;

use rayon::prelude::*;
use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};
use text_size::{TextRange, TextSize};
use tokio_util::sync::CancellationToken;

use crate::grammar::Grammar;
use crate::grammar::table::Action;
use crate::syntax::{SyntaxKind, Tree};

use super::errors::{ErrorCode, SyntaxError};
use super::lexer::{Lexer, Token};

/// Bound on virtual steps when probing a repair, and on real reduce chains
/// between shifts. Reduce chains longer than this only arise from degenerate
/// cyclic grammars.
const MAX_REDUCE_CHAIN: usize = 4096;
const MAX_SIM_STEPS: usize = 64;

/// Parse source text into a tree.
pub fn parse(grammar: &Arc<Grammar>, text: &str) -> Tree {
    parse_impl(grammar, text, None)
}

/// Parse with cooperative cancellation. The token is checked between engine
/// steps; once signalled, the unconsumed tail of the input is wrapped in an
/// error node and the returned tree is marked cancelled.
pub fn parse_with_cancellation(
    grammar: &Arc<Grammar>,
    text: &str,
    cancel: &CancellationToken,
) -> Tree {
    parse_impl(grammar, text, Some(cancel))
}

/// Parse many independent texts against one grammar in parallel. The
/// grammar table is read-only, so the parses share it without locking.
pub fn parse_batch(grammar: &Arc<Grammar>, texts: &[&str]) -> Vec<Tree> {
    texts.par_iter().map(|text| parse(grammar, text)).collect()
}

fn parse_impl(grammar: &Arc<Grammar>, text: &str, cancel: Option<&CancellationToken>) -> Tree {
    tracing::debug!(grammar = grammar.name(), len = text.len(), "parse");
    let raw = run_engine(grammar, text, grammar.start_kind(), cancel)
        .expect("the grammar start symbol always has an entry state");
    Tree::new(
        grammar.clone(),
        raw.green,
        raw.errors,
        raw.cancelled,
        TextSize::of(text),
    )
}

/// Engine output before it is packaged into a [`Tree`].
pub(crate) struct RawParse {
    pub(crate) green: GreenNode,
    pub(crate) errors: Vec<SyntaxError>,
    pub(crate) cancelled: bool,
}

/// Parse a slice of text with a recovery nonterminal as the start symbol.
/// Returns `None` if `start` has no entry state. Used by incremental
/// reparse.
pub(crate) fn parse_fragment(
    grammar: &Arc<Grammar>,
    text: &str,
    start: SyntaxKind,
) -> Option<RawParse> {
    run_engine(grammar, text, start, None)
}

fn run_engine(
    grammar: &Arc<Grammar>,
    text: &str,
    start: SyntaxKind,
    cancel: Option<&CancellationToken>,
) -> Option<RawParse> {
    let start_state = grammar.table.start_state(start)?;
    let tokens: Vec<Token<'_>> = Lexer::new(grammar, text).collect();
    let engine = Engine {
        grammar,
        tokens: &tokens,
        pos: 0,
        builder: GreenNodeBuilder::new(),
        states: Vec::with_capacity(32),
        syms: Vec::with_capacity(32),
        errors: Vec::new(),
        cancelled: false,
        just_inserted: false,
        cancel,
        end: TextSize::of(text),
    };
    Some(engine.run(start_state))
}

struct Engine<'a> {
    grammar: &'a Grammar,
    tokens: &'a [Token<'a>],
    /// Next token (trivia included) not yet moved into the builder.
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    /// LR state stack; always one longer than `syms`.
    states: Vec<u32>,
    /// One checkpoint per LR symbol, taken before its first byte.
    syms: Vec<Checkpoint>,
    errors: Vec<SyntaxError>,
    cancelled: bool,
    /// Set after a synthetic-token insertion; blocks a second consecutive
    /// insertion so recovery always consumes real input eventually.
    just_inserted: bool,
    cancel: Option<&'a CancellationToken>,
    end: TextSize,
}

impl Engine<'_> {
    fn run(mut self, start_state: u32) -> RawParse {
        self.states.push(start_state);
        self.builder.start_node(SyntaxKind::ROOT.into());
        let mut reduce_chain = 0usize;

        loop {
            if self.cancel.is_some_and(|c| c.is_cancelled()) {
                self.cancel_tail();
                break;
            }

            let la = self.lookahead_kind();
            let state = *self.states.last().expect("state stack is never empty");
            match self.grammar.table.action(state, la) {
                Some(Action::Shift(target)) => {
                    reduce_chain = 0;
                    self.shift(target);
                }
                Some(Action::Reduce(prod)) => {
                    reduce_chain += 1;
                    if reduce_chain > MAX_REDUCE_CHAIN || !self.reduce(prod) {
                        self.finish_exhausted();
                        break;
                    }
                }
                Some(Action::Accept) => {
                    // Trailing trivia belongs to the root.
                    self.flush_leading();
                    break;
                }
                None => {
                    reduce_chain = 0;
                    if !self.recover(la) {
                        self.finish_exhausted();
                        break;
                    }
                }
            }
        }

        self.builder.finish_node();
        RawParse {
            green: self.builder.finish(),
            errors: self.errors,
            cancelled: self.cancelled,
        }
    }

    // =========================================================================
    // Token scanning
    // =========================================================================

    /// Index of the next token the tables can act on. Trivia and
    /// unclassifiable bytes are skipped; both are flushed into the builder
    /// (and the latter wrapped in error nodes) at the next shift point, so
    /// pending reduces complete before junk is placed in the tree.
    fn next_significant(&self) -> Option<usize> {
        self.tokens[self.pos..]
            .iter()
            .position(|t| !t.kind.is_trivia() && t.kind != SyntaxKind::UNKNOWN)
            .map(|offset| self.pos + offset)
    }

    fn lookahead_kind(&self) -> SyntaxKind {
        self.next_significant()
            .map(|i| self.tokens[i].kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Byte offset where the next significant token starts, or end of input.
    fn lookahead_offset(&self) -> TextSize {
        self.next_significant()
            .map(|i| self.tokens[i].offset)
            .unwrap_or(self.end)
    }

    // =========================================================================
    // Builder plumbing
    // =========================================================================

    fn bump_token(&mut self) {
        let token = &self.tokens[self.pos];
        self.builder.token(token.kind.into(), token.text);
        self.pos += 1;
    }

    /// Move every token before `until` into the builder.
    fn flush_to(&mut self, until: usize) {
        while self.pos < until {
            self.bump_token();
        }
    }

    /// Flush trivia up to the next significant token, wrapping any
    /// unclassifiable tokens in error nodes as they pass.
    fn flush_leading(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if token.kind.is_trivia() {
                self.bump_token();
            } else if token.kind == SyntaxKind::UNKNOWN {
                self.wrap_unknown();
            } else {
                break;
            }
        }
    }

    // =========================================================================
    // Core actions
    // =========================================================================

    fn shift(&mut self, target: u32) {
        self.flush_leading();
        let checkpoint = self.builder.checkpoint();
        self.bump_token();
        self.states.push(target);
        self.syms.push(checkpoint);
        self.just_inserted = false;
    }

    fn reduce(&mut self, prod: u32) -> bool {
        let production = &self.grammar.productions[prod as usize];
        let count = production.rhs.len();
        let checkpoint = if count > 0 {
            self.syms[self.syms.len() - count]
        } else {
            // Empty production: a zero-width node at the current position.
            self.builder.checkpoint()
        };
        self.states.truncate(self.states.len() - count);
        self.syms.truncate(self.syms.len() - count);
        if !production.hidden {
            self.builder.start_node_at(checkpoint, production.lhs.into());
            self.builder.finish_node();
        }
        let state = *self.states.last().expect("state stack is never empty");
        let Some(next) = self.grammar.table.goto(state, production.lhs) else {
            debug_assert!(false, "missing goto after reduce");
            return false;
        };
        self.states.push(next);
        self.syms.push(checkpoint);
        true
    }

    // =========================================================================
    // Lexical errors
    // =========================================================================

    /// Wrap the unclassifiable token at the current position in an error
    /// node and diagnose it by shape.
    fn wrap_unknown(&mut self) {
        let token = self.tokens[self.pos];
        let code = if token.text.starts_with('"') {
            ErrorCode::E0102
        } else if token.text.starts_with("/*") {
            ErrorCode::E0103
        } else {
            ErrorCode::E0101
        };
        self.errors
            .push(SyntaxError::from_code(token.range(), code));
        self.builder.start_node(SyntaxKind::ERROR.into());
        self.bump_token();
        self.builder.finish_node();
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    fn recover(&mut self, la: SyntaxKind) -> bool {
        if !self.just_inserted {
            if let Some(kind) = self.find_insertion(la) {
                let offset = self.lookahead_offset();
                self.errors.push(
                    SyntaxError::at_offset(
                        format!("missing {}", self.display(kind)),
                        offset,
                        ErrorCode::E0202,
                    )
                    .with_hint(format!("insert {} here", self.display(kind))),
                );
                if self.apply_insertion(kind) {
                    self.just_inserted = true;
                    return true;
                }
            }
        }

        let state = *self.states.last().expect("state stack is never empty");
        if la == SyntaxKind::EOF {
            self.errors.push(
                SyntaxError::at_offset("unexpected end of input", self.end, ErrorCode::E0203)
                    .with_hint(self.expected_hint(state)),
            );
        } else {
            let token = self.tokens[self.next_significant().expect("lookahead exists")];
            self.errors.push(
                SyntaxError::new(
                    format!("unexpected {}", self.display(la)),
                    token.range(),
                    ErrorCode::E0201,
                )
                .with_hint(self.expected_hint(state)),
            );
        }
        self.just_inserted = false;
        self.panic_recover()
    }

    /// A terminal whose zero-width insertion lets the real lookahead make
    /// progress, if one exists. Candidates are probed in sorted kind order
    /// so recovery is deterministic.
    fn find_insertion(&self, la: SyntaxKind) -> Option<SyntaxKind> {
        let state = *self.states.last().expect("state stack is never empty");
        self.grammar
            .table
            .expected_terminals(state)
            .into_iter()
            .filter(|&t| t != SyntaxKind::EOF)
            .find(|&t| {
                let mut states = self.states.clone();
                self.simulate_feed(&mut states, t) && self.simulate_feed(&mut states, la)
            })
    }

    /// Drive a scratch state stack as if `t` were the next token. Returns
    /// true once `t` is consumed (or accepted, for EOF).
    fn simulate_feed(&self, states: &mut Vec<u32>, t: SyntaxKind) -> bool {
        for _ in 0..MAX_SIM_STEPS {
            let state = *states.last().expect("state stack is never empty");
            match self.grammar.table.action(state, t) {
                Some(Action::Shift(target)) => {
                    states.push(target);
                    return true;
                }
                Some(Action::Reduce(prod)) => {
                    let production = &self.grammar.productions[prod as usize];
                    states.truncate(states.len() - production.rhs.len());
                    match self
                        .grammar
                        .table
                        .goto(*states.last().expect("state stack is never empty"), production.lhs)
                    {
                        Some(next) => states.push(next),
                        None => return false,
                    }
                }
                Some(Action::Accept) => return t == SyntaxKind::EOF,
                None => return false,
            }
        }
        false
    }

    /// Shift a zero-width synthetic token of `kind`, performing any reduces
    /// its lookahead triggers first. The token is wrapped in an error node.
    fn apply_insertion(&mut self, kind: SyntaxKind) -> bool {
        for _ in 0..MAX_SIM_STEPS {
            let state = *self.states.last().expect("state stack is never empty");
            match self.grammar.table.action(state, kind) {
                Some(Action::Shift(target)) => {
                    self.flush_leading();
                    let checkpoint = self.builder.checkpoint();
                    self.builder.start_node(SyntaxKind::ERROR.into());
                    self.builder.token(kind.into(), "");
                    self.builder.finish_node();
                    self.states.push(target);
                    self.syms.push(checkpoint);
                    return true;
                }
                Some(Action::Reduce(prod)) => {
                    if !self.reduce(prod) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        false
    }

    /// Panic-mode recovery: scan forward for the first token some stack
    /// state can act on, pop to that state, and wrap everything skipped or
    /// popped in an error node. Returns false when no resynchronization
    /// point exists before end of input.
    fn panic_recover(&mut self) -> bool {
        let mut scan = self.pos;
        let target: Option<(usize, usize)> = loop {
            let next = self.tokens[scan..]
                .iter()
                .position(|t| !t.kind.is_trivia() && t.kind != SyntaxKind::UNKNOWN)
                .map(|offset| scan + offset);
            match next {
                Some(i) => {
                    let kind = self.tokens[i].kind;
                    let actionable = self
                        .states
                        .iter()
                        .rposition(|&s| self.grammar.table.action(s, kind).is_some());
                    if let Some(state_index) = actionable {
                        break Some((i, state_index));
                    }
                    scan = i + 1;
                }
                None => {
                    break self
                        .states
                        .iter()
                        .rposition(|&s| self.grammar.table.action(s, SyntaxKind::EOF).is_some())
                        .map(|state_index| (self.tokens.len(), state_index));
                }
            }
        };

        let Some((resume, state_index)) = target else {
            return false;
        };
        let pops = self.states.len() - 1 - state_index;
        let checkpoint = if pops > 0 {
            self.syms[self.syms.len() - pops]
        } else {
            self.flush_leading();
            self.builder.checkpoint()
        };
        self.builder.start_node_at(checkpoint, SyntaxKind::ERROR.into());
        self.flush_to(resume);
        self.builder.finish_node();
        self.states.truncate(state_index + 1);
        let keep = self.syms.len() - pops;
        self.syms.truncate(keep);
        tracing::trace!(
            skipped_to = resume,
            popped = pops,
            "resynchronized after syntax error"
        );
        true
    }

    /// No resynchronization point exists: mark the remainder and stop.
    fn finish_exhausted(&mut self) {
        let from = self.lookahead_offset();
        self.errors.push(SyntaxError::new(
            "could not recover from syntax errors before end of input",
            TextRange::new(from, self.end),
            ErrorCode::E0301,
        ));
        if self.next_significant().is_some() {
            self.flush_leading();
            self.builder.start_node(SyntaxKind::ERROR.into());
            self.flush_to(self.tokens.len());
            self.builder.finish_node();
        } else {
            self.flush_leading();
        }
    }

    fn cancel_tail(&mut self) {
        let offset = self.lookahead_offset();
        self.errors.push(SyntaxError::at_offset(
            "parse cancelled; the remainder of the input was not parsed",
            offset,
            ErrorCode::E0401,
        ));
        if self.next_significant().is_some() {
            self.flush_leading();
            self.builder.start_node(SyntaxKind::ERROR.into());
            self.flush_to(self.tokens.len());
            self.builder.finish_node();
        } else {
            self.flush_leading();
        }
        self.cancelled = true;
        tracing::debug!(offset = u32::from(offset), "parse cancelled");
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn display(&self, kind: SyntaxKind) -> String {
        format!("`{}`", self.grammar.kind_name(kind))
    }

    fn expected_hint(&self, state: u32) -> String {
        let expected = self.grammar.table.expected_terminals(state);
        let names: Vec<String> = expected.iter().take(8).map(|&k| self.display(k)).collect();
        let mut hint = format!("expected {}", names.join(", "));
        if expected.len() > 8 {
            hint.push_str(", ...");
        }
        hint
    }
}
