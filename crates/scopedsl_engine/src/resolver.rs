//! Node resolvers and the dispatch table.
//!
//! Each [`NodeKind`] is handled by exactly one [`NodeResolver`]. Resolvers
//! recurse into child nodes through [`Dispatcher::dispatch`], which enforces
//! the depth limit and emits timing events when tracing.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;

use scopedsl_foundation::{EntityId, EntityManager, Error, ErrorKind, JsonValue, Result, path};
use scopedsl_language::{
    FilterContext, FilterEvaluator, FilterExpr, Node, NodeKind, ScopeExpr, SourceRef, Subject,
};
use tracing::trace;

use crate::candidate::CandidateSet;
use crate::config::EngineConfig;
use crate::context::ResolutionContext;
use crate::error_handler::ErrorHandler;
use crate::registry::ScopeRegistry;
use crate::trace::TraceEvent;

// =============================================================================
// Resolver Trait
// =============================================================================

/// Resolves one kind of AST node into candidates.
pub trait NodeResolver: Send + Sync {
    /// Name used in trace events (`"FilterResolver"`, ...).
    fn name(&self) -> &'static str;

    /// Resolves `node`, dispatching children through `env`.
    ///
    /// # Errors
    ///
    /// Returns any error that makes the node unresolvable.
    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>>;
}

fn mismatch(resolver: &'static str, node: &ScopeExpr) -> Error {
    Error::new(ErrorKind::Internal(format!(
        "{resolver} cannot resolve {:?} node",
        node.kind()
    )))
}

// =============================================================================
// Resolver Registry
// =============================================================================

/// Dispatch table from node kind to resolver.
pub struct ResolverRegistry {
    resolvers: HashMap<NodeKind, Box<dyn NodeResolver>>,
}

impl ResolverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in resolver for every node kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NodeKind::Source, Box::new(SourceRefResolver));
        registry.register(NodeKind::Filter, Box::new(FilterResolver));
        registry.register(NodeKind::Union, Box::new(UnionResolver));
        registry.register(NodeKind::PropertyAccess, Box::new(PropertyAccessResolver));
        registry.register(NodeKind::ArrayIterate, Box::new(ArrayIterateResolver));
        registry
    }

    /// Installs a resolver, returning the one it replaced.
    pub fn register(
        &mut self,
        kind: NodeKind,
        resolver: Box<dyn NodeResolver>,
    ) -> Option<Box<dyn NodeResolver>> {
        self.resolvers.insert(kind, resolver)
    }

    /// Returns the resolver for a node kind.
    #[must_use]
    pub fn get(&self, kind: NodeKind) -> Option<&dyn NodeResolver> {
        self.resolvers.get(&kind).map(Box::as_ref)
    }

    /// Returns `(kind, resolver name)` pairs in node-kind order.
    #[must_use]
    pub fn names(&self) -> Vec<(NodeKind, &'static str)> {
        NodeKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind).map(|r| (*kind, r.name())))
            .collect()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.names()).finish()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Everything a resolver can reach during one call.
///
/// Borrows the engine's registries and the entity manager for `'w`; value
/// candidates borrow component data for the same lifetime.
#[derive(Clone, Copy)]
pub struct Dispatcher<'w> {
    scopes: &'w ScopeRegistry,
    resolvers: &'w ResolverRegistry,
    evaluator: &'w FilterEvaluator,
    errors: &'w ErrorHandler,
    config: &'w EngineConfig,
    entities: &'w dyn EntityManager,
}

impl<'w> Dispatcher<'w> {
    pub(crate) fn new(
        scopes: &'w ScopeRegistry,
        resolvers: &'w ResolverRegistry,
        evaluator: &'w FilterEvaluator,
        errors: &'w ErrorHandler,
        config: &'w EngineConfig,
        entities: &'w dyn EntityManager,
    ) -> Self {
        Self {
            scopes,
            resolvers,
            evaluator,
            errors,
            config,
            entities,
        }
    }

    /// Returns the scope registry.
    #[must_use]
    pub fn scopes(&self) -> &'w ScopeRegistry {
        self.scopes
    }

    /// Returns the filter evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &'w FilterEvaluator {
        self.evaluator
    }

    /// Returns the entity manager.
    #[must_use]
    pub fn entities(&self) -> &'w dyn EntityManager {
        self.entities
    }

    /// Reports an error to the error handler and the tracer.
    pub fn report(&self, error: &Error, ctx: &mut ResolutionContext<'_>) {
        let category = self.errors.report(error, None);
        ctx.record(TraceEvent::Error {
            category,
            message: error.to_string(),
        });
    }

    /// Resolves a node with the registered resolver for its kind.
    ///
    /// # Errors
    ///
    /// Returns `DepthLimit` if nesting exceeds the configured limit, or the
    /// resolver's own error.
    pub fn dispatch(
        &self,
        node: &ScopeExpr,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        if ctx.depth() >= self.config.max_depth {
            return Err(Error::depth_limit(self.config.max_depth));
        }
        let resolver = self.resolvers.get(node.kind()).ok_or_else(|| {
            Error::new(ErrorKind::Internal(format!(
                "no resolver registered for {:?}",
                node.kind()
            )))
        })?;

        ctx.enter();
        let result = if ctx.is_tracing() {
            let saved = ctx.take_child_time();
            let start = Instant::now();
            let result = resolver.resolve(node, self, ctx);
            let duration = start.elapsed();
            let nested = ctx.replace_child_time(saved + duration);
            if let Ok(candidates) = &result {
                let scope_id = ctx.current_scope().map(str::to_string);
                ctx.record(TraceEvent::ResolverStep {
                    resolver: resolver.name(),
                    scope_id,
                    duration,
                    self_duration: duration.saturating_sub(nested),
                    result_size: candidates.len(),
                });
            }
            result
        } else {
            resolver.resolve(node, self, ctx)
        };
        ctx.exit();
        result
    }
}

impl fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("scopes", &self.scopes.len())
            .field("resolvers", self.resolvers)
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Candidate classification
// =============================================================================

/// What to do with a string that names no entity.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Dangling {
    Skip,
    Keep,
}

/// Turns a JSON value reached by property access or iteration into a
/// candidate. Strings naming existing entities become entity candidates;
/// `null` is dropped.
fn absorb<'w>(
    out: &mut CandidateSet<'w>,
    entities: &dyn EntityManager,
    value: Cow<'w, JsonValue>,
    dangling: Dangling,
) {
    if value.is_null() {
        return;
    }
    if let Some(id) = value.as_str() {
        if entities.has_entity(id) {
            out.insert_entity(EntityId::new(id));
            return;
        }
        if dangling == Dangling::Skip {
            trace!(reference = id, "skipping dangling entity reference");
            return;
        }
    }
    out.insert_value(value);
}

// =============================================================================
// Source Resolver
// =============================================================================

/// Resolves built-in sources and named scope references.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceRefResolver;

impl SourceRefResolver {
    fn resolve_reference<'w>(
        id: &str,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        if let Some(start) = ctx.visiting().iter().position(|s| s == id) {
            let mut chain = ctx.visiting()[start..].to_vec();
            chain.push(id.to_string());
            return Err(Error::cyclic_scope(chain));
        }
        let expr = env
            .scopes()
            .get(id)
            .ok_or_else(|| Error::unknown_scope(id))?;

        ctx.push_scope(id);
        let result = env.dispatch(expr, ctx);
        ctx.pop_scope();
        result.map_err(|e| e.in_scope(id))
    }
}

impl NodeResolver for SourceRefResolver {
    fn name(&self) -> &'static str {
        "SourceRefResolver"
    }

    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        let Node::Source(source) = &node.node else {
            return Err(mismatch(self.name(), node));
        };
        match source {
            SourceRef::Actor | SourceRef::SelfRef => {
                Ok(CandidateSet::from_entities([ctx.actor().clone()]))
            }
            SourceRef::Location => ctx
                .location()
                .map(|id| CandidateSet::from_entities([id.clone()]))
                .ok_or_else(|| Error::missing_dependency("location", self.name())),
            SourceRef::Nothing => Ok(CandidateSet::new()),
            SourceRef::Entities {
                component,
                negated: false,
            } => Ok(env.entities().entities_with_component(component).into_iter().collect()),
            SourceRef::Entities {
                component,
                negated: true,
            } => {
                let with: BTreeSet<EntityId> = env
                    .entities()
                    .entities_with_component(component)
                    .into_iter()
                    .collect();
                Ok(env
                    .entities()
                    .entity_ids()
                    .into_iter()
                    .filter(|id| !with.contains(id))
                    .collect())
            }
            SourceRef::Scope(id) => Self::resolve_reference(id, env, ctx),
        }
    }
}

// =============================================================================
// Filter Resolver
// =============================================================================

/// Keeps the candidates a JSON-Logic filter accepts.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterResolver;

impl FilterResolver {
    /// Evaluates one candidate. Evaluation errors exclude the candidate.
    fn check(
        env: &Dispatcher<'_>,
        expr: &FilterExpr,
        filter_ctx: &FilterContext<'_>,
        entity: Option<&EntityId>,
        ctx: &mut ResolutionContext<'_>,
    ) -> bool {
        let start = ctx.is_tracing().then(Instant::now);
        let passed = match env.evaluator().evaluate(expr, filter_ctx) {
            Ok(passed) => passed,
            Err(err) => {
                let err = match ctx.current_scope() {
                    Some(scope) => err.in_scope(scope),
                    None => err,
                };
                env.report(&err, ctx);
                false
            }
        };
        if let Some(start) = start {
            let duration = start.elapsed();
            ctx.add_child_time(duration);
            ctx.record(TraceEvent::FilterEvaluation {
                entity: entity.cloned(),
                duration,
                passed,
            });
        }
        passed
    }
}

impl NodeResolver for FilterResolver {
    fn name(&self) -> &'static str {
        "FilterResolver"
    }

    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        let Node::Filter { child, filter } = &node.node else {
            return Err(mismatch(self.name(), node));
        };
        let (ids, values) = env.dispatch(child, ctx)?.into_parts();

        let entities = env.entities();
        let actor = ctx.actor().clone();
        let location = ctx.location().cloned();
        let mut filter_ctx = FilterContext::new(
            Subject::for_id(entities, &actor),
            location
                .as_ref()
                .map_or(Subject::Absent, |id| Subject::for_id(entities, id)),
        );

        let mut kept = CandidateSet::new();
        for id in &ids {
            filter_ctx.set_entity(Subject::for_id(entities, id));
            if Self::check(env, filter.expr(), &filter_ctx, Some(id), ctx) {
                kept.insert_entity(id.clone());
            }
        }
        for value in &values {
            filter_ctx.set_entity(Subject::Value(&**value));
            if Self::check(env, filter.expr(), &filter_ctx, None, ctx) {
                kept.insert_value(value.clone());
            }
        }
        Ok(kept)
    }
}

// =============================================================================
// Union Resolver
// =============================================================================

/// Merges the candidates of every member.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnionResolver;

impl NodeResolver for UnionResolver {
    fn name(&self) -> &'static str {
        "UnionResolver"
    }

    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        let Node::Union(members) = &node.node else {
            return Err(mismatch(self.name(), node));
        };
        let mut merged = CandidateSet::new();
        for member in members {
            merged.extend(env.dispatch(member, ctx)?);
        }
        Ok(merged)
    }
}

// =============================================================================
// Property Access Resolver
// =============================================================================

/// Walks a component path from each candidate.
///
/// Entity candidates use entity path rules (`components.<cid>...`, `<cid>...`,
/// `id`); value candidates are walked as plain JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyAccessResolver;

impl NodeResolver for PropertyAccessResolver {
    fn name(&self) -> &'static str {
        "PropertyAccessResolver"
    }

    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        let Node::PropertyAccess { child, path: segments } = &node.node else {
            return Err(mismatch(self.name(), node));
        };
        let (ids, values) = env.dispatch(child, ctx)?.into_parts();
        let entities = env.entities();

        let mut out = CandidateSet::new();
        for id in &ids {
            let Some(view) = entities.entity(id) else {
                trace!(entity = %id, "property access on missing entity");
                continue;
            };
            if let Some(value) = view.lookup(segments) {
                absorb(&mut out, entities, value, Dangling::Skip);
            }
        }
        for value in values {
            if let Some(value) = path::walk_cow(value, segments) {
                absorb(&mut out, entities, value, Dangling::Skip);
            }
        }
        Ok(out)
    }
}

// =============================================================================
// Array Iterate Resolver
// =============================================================================

/// Flattens array candidates into their elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArrayIterateResolver;

impl NodeResolver for ArrayIterateResolver {
    fn name(&self) -> &'static str {
        "ArrayIterateResolver"
    }

    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        let Node::ArrayIterate(child) = &node.node else {
            return Err(mismatch(self.name(), node));
        };
        let (_, values) = env.dispatch(child, ctx)?.into_parts();
        let entities = env.entities();

        let mut out = CandidateSet::new();
        for value in values {
            match value {
                Cow::Borrowed(JsonValue::Array(items)) => {
                    for item in items {
                        absorb(&mut out, entities, Cow::Borrowed(item), Dangling::Keep);
                    }
                }
                Cow::Owned(JsonValue::Array(items)) => {
                    for item in items {
                        absorb(&mut out, entities, Cow::Owned(item), Dangling::Keep);
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }
}
