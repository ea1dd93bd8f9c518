//! The scope engine: registries plus the resolution entry points.

use std::sync::Arc;
use std::time::Instant;

use scopedsl_foundation::{EntityManager, EntitySet, Error, JsonValue, Result};
use scopedsl_language::{
    FilterEvaluator, NodeKind, ScopeExpr, SourceRef, Span, parse_definitions, parse_scope,
};
use tracing::debug;

use crate::candidate::CandidateSet;
use crate::config::EngineConfig;
use crate::context::{ActorContext, ResolutionContext};
use crate::error_handler::ErrorHandler;
use crate::registry::ScopeRegistry;
use crate::resolver::{Dispatcher, NodeResolver, ResolverRegistry};
use crate::trace::{NoopTracer, ResolutionTracer, TraceEvent};

/// Resolves scope expressions against an entity manager.
///
/// Registration takes `&mut self` and resolution takes `&self`, so the
/// registry cannot change while a resolution is running. Share an engine
/// across threads behind an `RwLock`.
#[derive(Debug, Default)]
pub struct ScopeEngine {
    config: EngineConfig,
    scopes: ScopeRegistry,
    resolvers: ResolverRegistry,
    evaluator: FilterEvaluator,
    errors: ErrorHandler,
}

impl ScopeEngine {
    /// Creates an engine with the default configuration and resolvers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            errors: ErrorHandler::with_capacity(config.error_buffer_size),
            config,
            scopes: ScopeRegistry::new(),
            resolvers: ResolverRegistry::with_defaults(),
            evaluator: FilterEvaluator::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the error handler.
    #[must_use]
    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    /// Returns the filter evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &FilterEvaluator {
        &self.evaluator
    }

    /// Returns the resolver registry.
    #[must_use]
    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a parsed scope. A later registration with the same id wins.
    pub fn register_scope(&mut self, id: impl Into<String>, expr: ScopeExpr) {
        let id = id.into();
        let text = expr.to_string();
        if self.scopes.insert(id.clone(), expr).is_some() {
            debug!(scope = %id, expr = %text, "scope definition overridden");
        } else {
            debug!(scope = %id, expr = %text, "scope registered");
        }
    }

    /// Parses and registers a scope.
    ///
    /// # Errors
    ///
    /// Returns (and reports) a syntax error; other scopes are left untouched.
    pub fn register_scope_source(&mut self, id: &str, source: &str) -> Result<()> {
        match parse_scope(source) {
            Ok(expr) => {
                self.register_scope(id, expr);
                Ok(())
            }
            Err(err) => Err(self.reject(err.in_scope(id))),
        }
    }

    /// Parses a definitions file and registers every scope in it.
    ///
    /// Returns the number of scopes registered.
    ///
    /// # Errors
    ///
    /// Returns (and reports) a syntax error; nothing from the file is
    /// registered in that case.
    pub fn register_definitions(&mut self, source: &str) -> Result<usize> {
        let definitions = parse_definitions(source).map_err(|err| self.reject(err))?;
        let count = definitions.len();
        for definition in definitions {
            self.register_scope(definition.id, definition.expr);
        }
        Ok(count)
    }

    /// Removes a scope. Returns true if it existed.
    pub fn unregister_scope(&mut self, id: &str) -> bool {
        let removed = self.scopes.remove(id).is_some();
        if removed {
            debug!(scope = id, "scope unregistered");
        }
        removed
    }

    /// Removes every scope.
    pub fn clear_scopes(&mut self) {
        self.scopes.clear();
    }

    /// Returns true if a scope is registered.
    #[must_use]
    pub fn has_scope(&self, id: &str) -> bool {
        self.scopes.contains(id)
    }

    /// Returns all registered scope ids, sorted.
    #[must_use]
    pub fn scope_ids(&self) -> Vec<&str> {
        self.scopes.ids()
    }

    /// Returns a registered scope's expression.
    #[must_use]
    pub fn scope(&self, id: &str) -> Option<&ScopeExpr> {
        self.scopes.get(id).map(Arc::as_ref)
    }

    /// Registers a named condition for `condition_ref`.
    ///
    /// # Errors
    ///
    /// Returns (and reports) a syntax error if the document is not valid
    /// JSON-Logic.
    pub fn register_condition(&mut self, id: &str, logic: &JsonValue) -> Result<()> {
        match self.evaluator.register_condition(id, logic) {
            Ok(()) => {
                debug!(condition = id, "condition registered");
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Replaces the resolver for a node kind.
    pub fn register_resolver(&mut self, kind: NodeKind, resolver: Box<dyn NodeResolver>) {
        debug!(kind = ?kind, resolver = resolver.name(), "resolver registered");
        self.resolvers.register(kind, resolver);
    }

    fn reject(&self, err: Error) -> Error {
        self.errors.report(&err, None);
        err
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves a registered scope to a set of entity ids.
    ///
    /// # Errors
    ///
    /// Returns (and reports) unknown-scope, cyclic-scope, missing-dependency,
    /// and depth-limit errors. Filter errors exclude the offending candidate
    /// without failing the resolution.
    pub fn resolve(
        &self,
        scope_id: &str,
        actor: &ActorContext,
        entities: &dyn EntityManager,
    ) -> Result<EntitySet> {
        self.resolve_traced(scope_id, actor, entities, &mut NoopTracer)
    }

    /// Resolves a registered scope, emitting events to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`ScopeEngine::resolve`].
    pub fn resolve_traced(
        &self,
        scope_id: &str,
        actor: &ActorContext,
        entities: &dyn EntityManager,
        tracer: &mut dyn ResolutionTracer,
    ) -> Result<EntitySet> {
        let root = ScopeExpr::source(SourceRef::Scope(scope_id.to_string()), Span::at_start());
        self.run(scope_id, Some(scope_id), &root, actor, entities, tracer)
    }

    /// Resolves an ad-hoc expression.
    ///
    /// # Errors
    ///
    /// See [`ScopeEngine::resolve`].
    pub fn resolve_expr(
        &self,
        expr: &ScopeExpr,
        actor: &ActorContext,
        entities: &dyn EntityManager,
    ) -> Result<EntitySet> {
        self.resolve_expr_traced(expr, actor, entities, &mut NoopTracer)
    }

    /// Resolves an ad-hoc expression, emitting events to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`ScopeEngine::resolve`].
    pub fn resolve_expr_traced(
        &self,
        expr: &ScopeExpr,
        actor: &ActorContext,
        entities: &dyn EntityManager,
        tracer: &mut dyn ResolutionTracer,
    ) -> Result<EntitySet> {
        let label = expr.to_string();
        self.run(&label, None, expr, actor, entities, tracer)
    }

    /// Resolves a registered scope, degrading any failure to an empty set.
    ///
    /// The failure is still reported to the error handler.
    #[must_use]
    pub fn resolve_or_empty(
        &self,
        scope_id: &str,
        actor: &ActorContext,
        entities: &dyn EntityManager,
    ) -> EntitySet {
        self.resolve(scope_id, actor, entities).unwrap_or_default()
    }

    /// Dispatches `expr`. Failures are attributed to `scope` when the
    /// resolver did not already name a more specific one.
    fn run(
        &self,
        label: &str,
        scope: Option<&str>,
        expr: &ScopeExpr,
        actor: &ActorContext,
        entities: &dyn EntityManager,
        tracer: &mut dyn ResolutionTracer,
    ) -> Result<EntitySet> {
        let dispatcher = Dispatcher::new(
            &self.scopes,
            &self.resolvers,
            &self.evaluator,
            &self.errors,
            &self.config,
            entities,
        );
        let mut ctx = ResolutionContext::new(actor, tracer);
        let start = ctx.is_tracing().then(Instant::now);
        if start.is_some() {
            ctx.record(TraceEvent::ResolveStart {
                scope_id: label.to_string(),
                actor: actor.actor().clone(),
            });
        }

        let result = dispatcher
            .dispatch(expr, &mut ctx)
            .map(CandidateSet::into_entities)
            .map_err(|err| match scope {
                Some(id) => err.in_scope(id),
                None => err,
            });
        if let Err(err) = &result {
            dispatcher.report(err, &mut ctx);
        }

        if let Some(start) = start {
            ctx.record(TraceEvent::ResolveEnd {
                scope_id: label.to_string(),
                result_size: result.as_ref().map_or(0, EntitySet::len),
                success: result.is_ok(),
                duration: start.elapsed(),
            });
        }
        result
    }
}
