//! Registry of named scope definitions.

use std::collections::HashMap;
use std::sync::Arc;

use scopedsl_language::ScopeExpr;

/// Named scope ASTs, keyed by namespaced id.
///
/// Definitions are `Arc`-shared so a resolution can hold one while the
/// registry stays borrowed immutably.
#[derive(Clone, Debug, Default)]
pub struct ScopeRegistry {
    scopes: HashMap<String, Arc<ScopeExpr>>,
}

impl ScopeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scope, returning the definition it replaced.
    pub fn insert(&mut self, id: impl Into<String>, expr: ScopeExpr) -> Option<Arc<ScopeExpr>> {
        self.scopes.insert(id.into(), Arc::new(expr))
    }

    /// Removes a scope.
    pub fn remove(&mut self, id: &str) -> Option<Arc<ScopeExpr>> {
        self.scopes.remove(id)
    }

    /// Removes every scope.
    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    /// Returns a scope definition.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<ScopeExpr>> {
        self.scopes.get(id)
    }

    /// Returns true if the scope is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.scopes.contains_key(id)
    }

    /// Returns all registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
