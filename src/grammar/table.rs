//! SLR(1) table construction.
//!
//! Builds the canonical LR(0) collection over the grammar's productions
//! (augmented with one synthetic start production per parse entry point),
//! computes FIRST/FOLLOW sets, and fills the action/goto tables the engine
//! executes. Conflicts are resolved at construction time so the tables are
//! total over their declared entries and the engine never has to choose:
//!
//! - shift/reduce: declared precedence and associativity; if neither side
//!   has a declared level, shift wins (maximal munch).
//! - reduce/reduce: the earlier production wins.
//!
//! Every resolution that falls back to a default is reported through
//! `tracing::warn!` so grammar authors can see where their declaration is
//! ambiguous.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::syntax::SyntaxKind;

use super::builder::Assoc;
use super::Production;

/// Precedence attached to a production for conflict resolution.
pub(crate) type ProdPrec = Option<(u32, Assoc)>;

/// A parser action for a (state, lookahead) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Shift(u32),
    /// Reduce by the given user production index.
    Reduce(u32),
    Accept,
}

/// Compiled action/goto tables with one entry state per start symbol.
#[derive(Debug)]
pub(crate) struct ParseTable {
    actions: Vec<FxHashMap<SyntaxKind, Action>>,
    gotos: Vec<FxHashMap<SyntaxKind, u32>>,
    starts: FxHashMap<SyntaxKind, u32>,
}

impl ParseTable {
    pub(crate) fn action(&self, state: u32, lookahead: SyntaxKind) -> Option<Action> {
        self.actions[state as usize].get(&lookahead).copied()
    }

    pub(crate) fn goto(&self, state: u32, nonterminal: SyntaxKind) -> Option<u32> {
        self.gotos[state as usize].get(&nonterminal).copied()
    }

    /// Entry state for a start symbol (the grammar start or a recovery
    /// nonterminal).
    pub(crate) fn start_state(&self, start: SyntaxKind) -> Option<u32> {
        self.starts.get(&start).copied()
    }

    /// Terminals with an action in `state`, sorted for deterministic
    /// diagnostics and recovery probing.
    pub(crate) fn expected_terminals(&self, state: u32) -> Vec<SyntaxKind> {
        let mut kinds: Vec<SyntaxKind> = self.actions[state as usize].keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    pub(crate) fn state_count(&self) -> usize {
        self.actions.len()
    }
}

/// An LR(0) item: a production with a dot position. Augmented start
/// productions use indices past the user production range.
type Item = (u32, u32);

struct Construction<'a> {
    /// Augmented productions first (one per start symbol), then user
    /// productions.
    prods: Vec<(SyntaxKind, Vec<SyntaxKind>)>,
    aug_count: u32,
    by_lhs: FxHashMap<SyntaxKind, Vec<u32>>,
    nullable: BTreeSet<SyntaxKind>,
    first: FxHashMap<SyntaxKind, BTreeSet<SyntaxKind>>,
    follow: FxHashMap<SyntaxKind, BTreeSet<SyntaxKind>>,
    display: &'a dyn Fn(SyntaxKind) -> SmolStr,
}

/// Synthetic left-hand sides for the augmented start productions; they sit
/// far above any grammar-assigned kind and never appear in trees.
fn aug_kind(i: usize) -> SyntaxKind {
    SyntaxKind(u16::MAX - i as u16)
}

pub(crate) fn build(
    grammar_name: &str,
    productions: &[Production],
    starts: &[SyntaxKind],
    term_prec: &FxHashMap<SyntaxKind, (u32, Assoc)>,
    prod_prec: &[ProdPrec],
    display: &dyn Fn(SyntaxKind) -> SmolStr,
) -> ParseTable {
    let mut prods: Vec<(SyntaxKind, Vec<SyntaxKind>)> = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        prods.push((aug_kind(i), vec![start]));
    }
    let aug_count = prods.len() as u32;
    for p in productions {
        prods.push((p.lhs, p.rhs.to_vec()));
    }

    let mut by_lhs: FxHashMap<SyntaxKind, Vec<u32>> = FxHashMap::default();
    for (i, (lhs, _)) in prods.iter().enumerate() {
        by_lhs.entry(*lhs).or_default().push(i as u32);
    }

    let mut cx = Construction {
        prods,
        aug_count,
        by_lhs,
        nullable: BTreeSet::new(),
        first: FxHashMap::default(),
        follow: FxHashMap::default(),
        display,
    };
    cx.compute_nullable();
    cx.compute_first();
    cx.compute_follow(starts);

    // Canonical LR(0) collection. States are keyed by their closed item set;
    // transition symbols are explored in sorted order so state numbering is
    // deterministic.
    let mut state_sets: Vec<BTreeSet<Item>> = Vec::new();
    let mut state_ids: FxHashMap<BTreeSet<Item>, u32> = FxHashMap::default();
    let mut starts_map: FxHashMap<SyntaxKind, u32> = FxHashMap::default();
    let mut worklist: Vec<u32> = Vec::new();

    for (i, &start) in starts.iter().enumerate() {
        let set = cx.closure(BTreeSet::from([(i as u32, 0)]));
        let id = intern_state(set, &mut state_sets, &mut state_ids, &mut worklist);
        starts_map.insert(start, id);
    }

    let mut actions: Vec<FxHashMap<SyntaxKind, Action>> = Vec::new();
    let mut gotos: Vec<FxHashMap<SyntaxKind, u32>> = Vec::new();

    while let Some(state) = worklist.pop() {
        let set = state_sets[state as usize].clone();
        while actions.len() <= state as usize {
            actions.push(FxHashMap::default());
            gotos.push(FxHashMap::default());
        }

        // Outgoing transitions, grouped by the symbol after the dot.
        let mut next_symbols: BTreeSet<SyntaxKind> = BTreeSet::new();
        for &(prod, dot) in &set {
            if let Some(&sym) = cx.prods[prod as usize].1.get(dot as usize) {
                next_symbols.insert(sym);
            }
        }
        for sym in next_symbols {
            let target_set = cx.goto_set(&set, sym);
            let target = intern_state(target_set, &mut state_sets, &mut state_ids, &mut worklist);
            if cx.is_nonterminal(sym) {
                gotos[state as usize].insert(sym, target);
            } else {
                insert_action(
                    &mut actions[state as usize],
                    sym,
                    Action::Shift(target),
                    grammar_name,
                    state,
                    productions,
                    term_prec,
                    prod_prec,
                    cx.display,
                );
            }
        }

        // Completed items become reduces (or accept for augmented starts).
        for &(prod, dot) in &set {
            let (lhs, rhs) = &cx.prods[prod as usize];
            if (dot as usize) < rhs.len() {
                continue;
            }
            if prod < cx.aug_count {
                insert_action(
                    &mut actions[state as usize],
                    SyntaxKind::EOF,
                    Action::Accept,
                    grammar_name,
                    state,
                    productions,
                    term_prec,
                    prod_prec,
                    cx.display,
                );
                continue;
            }
            let user_prod = prod - cx.aug_count;
            for &t in cx.follow.get(lhs).into_iter().flatten() {
                insert_action(
                    &mut actions[state as usize],
                    t,
                    Action::Reduce(user_prod),
                    grammar_name,
                    state,
                    productions,
                    term_prec,
                    prod_prec,
                    cx.display,
                );
            }
        }
    }

    tracing::trace!(
        grammar = grammar_name,
        states = state_sets.len(),
        "constructed LR automaton"
    );

    ParseTable {
        actions,
        gotos,
        starts: starts_map,
    }
}

fn intern_state(
    set: BTreeSet<Item>,
    state_sets: &mut Vec<BTreeSet<Item>>,
    state_ids: &mut FxHashMap<BTreeSet<Item>, u32>,
    worklist: &mut Vec<u32>,
) -> u32 {
    if let Some(&id) = state_ids.get(&set) {
        return id;
    }
    let id = state_sets.len() as u32;
    state_sets.push(set.clone());
    state_ids.insert(set, id);
    worklist.push(id);
    id
}

/// Insert an action, resolving conflicts against any existing entry.
#[allow(clippy::too_many_arguments)]
fn insert_action(
    entries: &mut FxHashMap<SyntaxKind, Action>,
    terminal: SyntaxKind,
    action: Action,
    grammar_name: &str,
    state: u32,
    productions: &[Production],
    term_prec: &FxHashMap<SyntaxKind, (u32, Assoc)>,
    prod_prec: &[ProdPrec],
    fmt_kind: &dyn Fn(SyntaxKind) -> SmolStr,
) {
    let Some(&existing) = entries.get(&terminal) else {
        entries.insert(terminal, action);
        return;
    };
    if existing == action {
        return;
    }
    let resolved = match (existing, action) {
        (Action::Shift(s), Action::Reduce(p)) | (Action::Reduce(p), Action::Shift(s)) => {
            resolve_shift_reduce(
                s,
                p,
                terminal,
                grammar_name,
                state,
                productions,
                term_prec,
                prod_prec,
                fmt_kind,
            )
        }
        (Action::Reduce(a), Action::Reduce(b)) => {
            let winner = a.min(b);
            tracing::warn!(
                grammar = grammar_name,
                state,
                lookahead = %fmt_kind(terminal),
                "reduce/reduce conflict between `{}` and `{}`; earlier production wins",
                fmt_kind(productions[a as usize].lhs),
                fmt_kind(productions[b as usize].lhs),
            );
            Action::Reduce(winner)
        }
        (Action::Accept, other) | (other, Action::Accept) => {
            tracing::warn!(
                grammar = grammar_name,
                state,
                "accept conflicts with {:?}; accept wins",
                other
            );
            Action::Accept
        }
        (Action::Shift(a), Action::Shift(b)) => {
            // Cannot happen: goto is a function of (state, symbol).
            debug_assert_eq!(a, b);
            existing
        }
    };
    entries.insert(terminal, resolved);
}

#[allow(clippy::too_many_arguments)]
fn resolve_shift_reduce(
    shift_target: u32,
    reduce_prod: u32,
    terminal: SyntaxKind,
    grammar_name: &str,
    state: u32,
    productions: &[Production],
    term_prec: &FxHashMap<SyntaxKind, (u32, Assoc)>,
    prod_prec: &[ProdPrec],
    fmt_kind: &dyn Fn(SyntaxKind) -> SmolStr,
) -> Action {
    let tp = term_prec.get(&terminal).copied();
    let pp = prod_prec[reduce_prod as usize];
    match (tp, pp) {
        (Some((t_level, assoc)), Some((p_level, _))) => {
            if p_level > t_level {
                Action::Reduce(reduce_prod)
            } else if p_level < t_level {
                Action::Shift(shift_target)
            } else {
                match assoc {
                    Assoc::Left => Action::Reduce(reduce_prod),
                    Assoc::Right => Action::Shift(shift_target),
                    Assoc::NonAssoc => {
                        tracing::warn!(
                            grammar = grammar_name,
                            state,
                            lookahead = %fmt_kind(terminal),
                            "non-associative operator chained; reducing"
                        );
                        Action::Reduce(reduce_prod)
                    }
                }
            }
        }
        _ => {
            tracing::warn!(
                grammar = grammar_name,
                state,
                lookahead = %fmt_kind(terminal),
                production = %fmt_kind(productions[reduce_prod as usize].lhs),
                "unresolved shift/reduce conflict; shifting (maximal munch)"
            );
            Action::Shift(shift_target)
        }
    }
}

impl Construction<'_> {
    fn is_nonterminal(&self, sym: SyntaxKind) -> bool {
        self.by_lhs.contains_key(&sym)
    }

    fn compute_nullable(&mut self) {
        loop {
            let mut changed = false;
            for (lhs, rhs) in &self.prods {
                if !self.nullable.contains(lhs) && rhs.iter().all(|s| self.nullable.contains(s)) {
                    self.nullable.insert(*lhs);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn compute_first(&mut self) {
        loop {
            let mut changed = false;
            for (lhs, rhs) in &self.prods {
                let mut addition: BTreeSet<SyntaxKind> = BTreeSet::new();
                for &sym in rhs {
                    if self.is_nonterminal(sym) {
                        if let Some(set) = self.first.get(&sym) {
                            addition.extend(set.iter().copied());
                        }
                        if !self.nullable.contains(&sym) {
                            break;
                        }
                    } else {
                        addition.insert(sym);
                        break;
                    }
                }
                let entry = self.first.entry(*lhs).or_default();
                let before = entry.len();
                entry.extend(addition);
                changed |= entry.len() != before;
            }
            if !changed {
                break;
            }
        }
    }

    /// FIRST of a symbol suffix, plus whether the whole suffix is nullable.
    fn first_of_seq(&self, seq: &[SyntaxKind]) -> (BTreeSet<SyntaxKind>, bool) {
        let mut out = BTreeSet::new();
        for &sym in seq {
            if self.is_nonterminal(sym) {
                if let Some(set) = self.first.get(&sym) {
                    out.extend(set.iter().copied());
                }
                if !self.nullable.contains(&sym) {
                    return (out, false);
                }
            } else {
                out.insert(sym);
                return (out, false);
            }
        }
        (out, true)
    }

    fn compute_follow(&mut self, starts: &[SyntaxKind]) {
        for &start in starts {
            self.follow.entry(start).or_default().insert(SyntaxKind::EOF);
        }
        loop {
            let mut changed = false;
            for (lhs, rhs) in &self.prods {
                for (i, &sym) in rhs.iter().enumerate() {
                    if !self.is_nonterminal(sym) {
                        continue;
                    }
                    let (mut addition, suffix_nullable) = self.first_of_seq(&rhs[i + 1..]);
                    if suffix_nullable {
                        if let Some(set) = self.follow.get(lhs) {
                            addition.extend(set.iter().copied());
                        }
                    }
                    let entry = self.follow.entry(sym).or_default();
                    let before = entry.len();
                    entry.extend(addition);
                    changed |= entry.len() != before;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn closure(&self, mut set: BTreeSet<Item>) -> BTreeSet<Item> {
        let mut pending: Vec<Item> = set.iter().copied().collect();
        while let Some((prod, dot)) = pending.pop() {
            let rhs = &self.prods[prod as usize].1;
            let Some(&next) = rhs.get(dot as usize) else {
                continue;
            };
            if let Some(prods) = self.by_lhs.get(&next) {
                for &p in prods {
                    let item = (p, 0);
                    if set.insert(item) {
                        pending.push(item);
                    }
                }
            }
        }
        set
    }

    fn goto_set(&self, set: &BTreeSet<Item>, sym: SyntaxKind) -> BTreeSet<Item> {
        let mut kernel = BTreeSet::new();
        for &(prod, dot) in set {
            if self.prods[prod as usize].1.get(dot as usize) == Some(&sym) {
                kernel.insert((prod, dot + 1));
            }
        }
        self.closure(kernel)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::{Grammar, GrammarBuilder};
    use super::*;

    /// expr → expr '+' int | int
    fn addition_grammar() -> Arc<Grammar> {
        let mut builder = GrammarBuilder::new("add", 1);
        let expr = builder.nonterminal("expr");
        let plus = builder.operator("+");
        let int = builder.int_literal();
        builder.precedence(Assoc::Left, &[plus]);
        builder.production(expr, &[expr, plus, int]);
        builder.production(expr, &[int]);
        builder.start(expr);
        builder.build().expect("grammar should build")
    }

    #[test]
    fn test_start_state_exists() {
        let grammar = addition_grammar();
        assert!(grammar.table.start_state(grammar.start_kind()).is_some());
    }

    #[test]
    fn test_initial_actions() {
        let grammar = addition_grammar();
        let start = grammar.table.start_state(grammar.start_kind()).unwrap();
        // Only `int` can begin an expression.
        let expected = grammar.table.expected_terminals(start);
        assert_eq!(expected, vec![SyntaxKind::INT]);
        assert!(matches!(
            grammar.table.action(start, SyntaxKind::INT),
            Some(Action::Shift(_))
        ));
        assert!(grammar.table.action(start, SyntaxKind::EOF).is_none());
    }

    #[test]
    fn test_reduce_then_accept() {
        let grammar = addition_grammar();
        let start = grammar.table.start_state(grammar.start_kind()).unwrap();
        let Some(Action::Shift(after_int)) = grammar.table.action(start, SyntaxKind::INT) else {
            panic!("expected shift on int");
        };
        // After `int`, end of input reduces expr → int.
        assert!(matches!(
            grammar.table.action(after_int, SyntaxKind::EOF),
            Some(Action::Reduce(_))
        ));
        // After the reduce, the goto target accepts on EOF.
        let expr_state = grammar.table.goto(start, grammar.start_kind()).unwrap();
        assert_eq!(
            grammar.table.action(expr_state, SyntaxKind::EOF),
            Some(Action::Accept)
        );
    }

    #[test]
    fn test_deterministic_construction() {
        let a = addition_grammar();
        let b = addition_grammar();
        assert_eq!(a.table.state_count(), b.table.state_count());
        assert_eq!(
            a.table.start_state(a.start_kind()),
            b.table.start_state(b.start_kind())
        );
    }
}
