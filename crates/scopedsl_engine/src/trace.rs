//! The tracing seam between the engine and a tracer.
//!
//! The engine emits [`TraceEvent`]s into a [`ResolutionTracer`]. The default
//! [`NoopTracer`] reports itself disabled, and the engine never reads the clock
//! while the tracer is disabled.

use std::time::Duration;

use scopedsl_foundation::{EntityId, ErrorCategory};

/// A single event emitted during resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// A top-level resolution started.
    ResolveStart {
        /// Scope being resolved (or the canonical expression text).
        scope_id: String,
        /// The acting entity.
        actor: EntityId,
    },
    /// A resolver finished handling one node.
    ResolverStep {
        /// Resolver name (`"FilterResolver"`, ...).
        resolver: &'static str,
        /// Innermost named scope being resolved.
        scope_id: Option<String>,
        /// Inclusive wall time.
        duration: Duration,
        /// Exclusive time: `duration` minus nested steps and filter evaluations.
        self_duration: Duration,
        /// Number of candidates produced.
        result_size: usize,
    },
    /// A filter was evaluated for one candidate.
    FilterEvaluation {
        /// The candidate, if it was an entity.
        entity: Option<EntityId>,
        /// Evaluation time.
        duration: Duration,
        /// Whether the candidate was kept.
        passed: bool,
    },
    /// A top-level resolution finished.
    ResolveEnd {
        /// Scope that was resolved.
        scope_id: String,
        /// Final entity count (0 on failure).
        result_size: usize,
        /// False if resolution returned an error.
        success: bool,
        /// Total wall time.
        duration: Duration,
    },
    /// An error was reported during resolution.
    Error {
        /// Error category.
        category: ErrorCategory,
        /// Rendered message.
        message: String,
    },
}

impl TraceEvent {
    /// Returns the event type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::ResolveStart { .. } => "resolve_start",
            Self::ResolverStep { .. } => "resolver_step",
            Self::FilterEvaluation { .. } => "filter_evaluation",
            Self::ResolveEnd { .. } => "resolve_end",
            Self::Error { .. } => "error",
        }
    }
}

/// Receives trace events from the engine.
pub trait ResolutionTracer {
    /// Returns true if events should be produced at all.
    fn is_enabled(&self) -> bool;

    /// Records one event.
    fn record(&mut self, event: TraceEvent);
}

/// A tracer that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

impl ResolutionTracer for NoopTracer {
    fn is_enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _event: TraceEvent) {}
}

/// Collects every event in order. Handy in tests.
impl ResolutionTracer for Vec<TraceEvent> {
    fn is_enabled(&self) -> bool {
        true
    }

    fn record(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
