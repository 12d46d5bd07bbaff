//! Shared cache of loaded grammars.
//!
//! Hosts that serve many documents (an editor, a build daemon) load each
//! grammar once and look it up by name afterwards. The registry is just a
//! name → `Arc<Grammar>` map behind a `parking_lot` lock; grammars
//! themselves are immutable, so lookups hand out cheap clones of the `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::Grammar;

/// A thread-safe, name-keyed cache of compiled grammars.
#[derive(Debug, Default)]
pub struct GrammarRegistry {
    grammars: RwLock<FxHashMap<SmolStr, Arc<Grammar>>>,
}

impl GrammarRegistry {
    pub fn new() -> GrammarRegistry {
        GrammarRegistry::default()
    }

    /// Register a grammar under its declared name, returning the previously
    /// registered grammar of that name, if any.
    pub fn insert(&self, grammar: Arc<Grammar>) -> Option<Arc<Grammar>> {
        let name = SmolStr::new(grammar.name());
        tracing::debug!(grammar = %name, version = grammar.version(), "registering grammar");
        self.grammars.write().insert(name, grammar)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Grammar>> {
        self.grammars.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Grammar>> {
        self.grammars.write().remove(name)
    }

    /// Names of all registered grammars, sorted.
    pub fn names(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = self.grammars.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.grammars.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.read().is_empty()
    }
}
