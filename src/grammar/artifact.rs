//! Grammar data artifacts (feature `artifact`).
//!
//! A grammar can be supplied to the core as a JSON document instead of
//! through builder calls, so the table description can live next to the
//! host's other build outputs. The artifact is validated exactly like a
//! builder declaration; a format-version mismatch is fatal at load time.
//!
//! Symbols on production right-hand sides are written as plain strings and
//! resolved in this order: declared rule names, reserved terminal classes
//! (`ident`, `int`, `float`, `string`, `char`), then keyword (identifier
//! shaped) or operator (punctuation shaped) literals.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::builder::{is_operator_char, Assoc, GrammarBuilder, SymbolRef};
use super::{Grammar, GrammarError};

/// Artifact format version this build understands.
pub const FORMAT_VERSION: u32 = 1;

/// Serialized form of a grammar declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarSpec {
    pub format_version: u32,
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub precedence: Vec<PrecedenceSpec>,
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub recovery: Vec<RecoverySpec>,
    pub start: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedenceSpec {
    pub assoc: AssocSpec,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssocSpec {
    Left,
    Right,
    NonAssoc,
}

impl From<AssocSpec> for Assoc {
    fn from(spec: AssocSpec) -> Assoc {
        match spec {
            AssocSpec::Left => Assoc::Left,
            AssocSpec::Right => Assoc::Right,
            AssocSpec::NonAssoc => Assoc::NonAssoc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    /// Alternatives, each a sequence of symbol names.
    pub alternatives: Vec<Vec<String>>,
    /// Optional precedence tag (a terminal name) applied to every
    /// alternative of this rule.
    #[serde(default)]
    pub prec: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySpec {
    pub rule: String,
    pub terminators: Vec<String>,
}

impl GrammarSpec {
    /// Parse a JSON artifact without building it.
    pub fn from_json(json: &str) -> Result<GrammarSpec, GrammarError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate this artifact and compile it into a grammar.
    pub fn build(&self) -> Result<Arc<Grammar>, GrammarError> {
        if self.format_version != FORMAT_VERSION {
            return Err(GrammarError::FormatVersion {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let mut builder = GrammarBuilder::new(&self.name, self.version);

        // Declare rules first so rule names shadow terminal spellings.
        for rule in &self.rules {
            builder.nonterminal(&rule.name);
        }

        let resolve = |builder: &mut GrammarBuilder, name: &str| -> Result<SymbolRef, GrammarError> {
            if self.rules.iter().any(|r| r.name == name) {
                return Ok(builder.nonterminal(name));
            }
            match name {
                "ident" => return Ok(builder.ident()),
                "int" => return Ok(builder.int_literal()),
                "float" => return Ok(builder.float_literal()),
                "string" => return Ok(builder.string_literal()),
                "char" => return Ok(builder.char_literal()),
                _ => {}
            }
            let mut chars = name.chars();
            match chars.next() {
                Some(c) if c == '_' || unicode_ident::is_xid_start(c) => Ok(builder.keyword(name)),
                Some(c) if is_operator_char(c) => Ok(builder.operator(name)),
                _ => Err(GrammarError::UnknownSymbol(name.to_string())),
            }
        };

        for level in &self.precedence {
            let mut tokens = Vec::with_capacity(level.tokens.len());
            for name in &level.tokens {
                tokens.push(resolve(&mut builder, name)?);
            }
            builder.precedence(level.assoc.into(), &tokens);
        }

        for rule in &self.rules {
            let lhs = builder.nonterminal(&rule.name);
            let prec = match &rule.prec {
                Some(name) => Some(resolve(&mut builder, name)?),
                None => None,
            };
            for alternative in &rule.alternatives {
                let mut rhs = Vec::with_capacity(alternative.len());
                for name in alternative {
                    rhs.push(resolve(&mut builder, name)?);
                }
                match prec {
                    Some(tag) => builder.production_with_prec(lhs, &rhs, tag),
                    None => builder.production(lhs, &rhs),
                }
            }
        }

        for recovery in &self.recovery {
            if !self.rules.iter().any(|r| r.name == recovery.rule) {
                return Err(GrammarError::UnknownSymbol(recovery.rule.clone()));
            }
            let rule = builder.nonterminal(&recovery.rule);
            let mut terminators = Vec::with_capacity(recovery.terminators.len());
            for name in &recovery.terminators {
                terminators.push(resolve(&mut builder, name)?);
            }
            builder.recover_at(rule, &terminators);
        }

        if !self.rules.iter().any(|r| r.name == self.start) {
            return Err(GrammarError::UnknownSymbol(self.start.clone()));
        }
        let start = builder.nonterminal(&self.start);
        builder.start(start);

        builder.build()
    }
}

/// Load a grammar from a JSON artifact.
pub fn load_grammar(json: &str) -> Result<Arc<Grammar>, GrammarError> {
    GrammarSpec::from_json(json)?.build()
}
