//! Per-call resolution state.

use std::time::Duration;

use scopedsl_foundation::EntityId;

use crate::trace::{ResolutionTracer, TraceEvent};

// =============================================================================
// Actor Context
// =============================================================================

/// Who is asking: the acting entity and, optionally, where it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorContext {
    actor: EntityId,
    location: Option<EntityId>,
}

impl ActorContext {
    /// Creates a context for the given actor, with no location.
    #[must_use]
    pub fn new(actor: impl Into<EntityId>) -> Self {
        Self {
            actor: actor.into(),
            location: None,
        }
    }

    /// Builder method to set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<EntityId>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns the acting entity.
    #[must_use]
    pub fn actor(&self) -> &EntityId {
        &self.actor
    }

    /// Returns the actor's location, if known.
    #[must_use]
    pub fn location(&self) -> Option<&EntityId> {
        self.location.as_ref()
    }
}

// =============================================================================
// Resolution Context
// =============================================================================

/// Mutable state owned by a single `resolve()` call.
///
/// Holds the visiting stack for cycle detection, the dispatch depth, and the
/// tracer handle. `child_time` accumulates time spent in nested resolver
/// steps and filter evaluations so each step can report its exclusive time.
pub struct ResolutionContext<'t> {
    actor: EntityId,
    location: Option<EntityId>,
    visiting: Vec<String>,
    depth: usize,
    tracer: &'t mut dyn ResolutionTracer,
    tracing: bool,
    child_time: Duration,
}

impl<'t> ResolutionContext<'t> {
    /// Creates a context for one call.
    pub fn new(actor: &ActorContext, tracer: &'t mut dyn ResolutionTracer) -> Self {
        let tracing = tracer.is_enabled();
        Self {
            actor: actor.actor.clone(),
            location: actor.location.clone(),
            visiting: Vec::new(),
            depth: 0,
            tracer,
            tracing,
            child_time: Duration::ZERO,
        }
    }

    /// Returns the acting entity.
    #[must_use]
    pub fn actor(&self) -> &EntityId {
        &self.actor
    }

    /// Returns the actor's location, if supplied.
    #[must_use]
    pub fn location(&self) -> Option<&EntityId> {
        self.location.as_ref()
    }

    /// Returns true if events should be recorded.
    ///
    /// Sampled once when the call starts.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Sends an event to the tracer, if tracing.
    pub fn record(&mut self, event: TraceEvent) {
        if self.tracing {
            self.tracer.record(event);
        }
    }

    // -------------------------------------------------------------------------
    // Scope stack
    // -------------------------------------------------------------------------

    /// Returns the scopes currently being resolved, outermost first.
    #[must_use]
    pub fn visiting(&self) -> &[String] {
        &self.visiting
    }

    /// Returns true if `id` is already being resolved in this call.
    #[must_use]
    pub fn is_visiting(&self, id: &str) -> bool {
        self.visiting.iter().any(|s| s == id)
    }

    /// Marks a scope as being resolved.
    pub fn push_scope(&mut self, id: impl Into<String>) {
        self.visiting.push(id.into());
    }

    /// Unmarks the innermost scope.
    pub fn pop_scope(&mut self) -> Option<String> {
        self.visiting.pop()
    }

    /// Returns the innermost scope being resolved.
    #[must_use]
    pub fn current_scope(&self) -> Option<&str> {
        self.visiting.last().map(String::as_str)
    }

    // -------------------------------------------------------------------------
    // Depth and timing
    // -------------------------------------------------------------------------

    /// Returns the current dispatch depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Charges time spent in nested work to the enclosing resolver step.
    pub fn add_child_time(&mut self, duration: Duration) {
        self.child_time += duration;
    }

    pub(crate) fn take_child_time(&mut self) -> Duration {
        std::mem::take(&mut self.child_time)
    }

    pub(crate) fn replace_child_time(&mut self, duration: Duration) -> Duration {
        std::mem::replace(&mut self.child_time, duration)
    }
}

impl std::fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("actor", &self.actor)
            .field("location", &self.location)
            .field("visiting", &self.visiting)
            .field("depth", &self.depth)
            .field("tracing", &self.tracing)
            .finish_non_exhaustive()
    }
}
