//! Trace record type.

use scopedsl_engine::TraceEvent;

/// A trace event stamped with its position in the trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    /// Monotonic record id.
    pub id: u64,
    /// Nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new record.
    #[must_use]
    pub fn new(id: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            timestamp_ns,
            event,
        }
    }

    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.type_name()
    }

    /// Returns true if this is a resolver step.
    #[must_use]
    pub fn is_step(&self) -> bool {
        matches!(self.event, TraceEvent::ResolverStep { .. })
    }

    /// Returns true if this is a resolve start or end.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        matches!(
            self.event,
            TraceEvent::ResolveStart { .. } | TraceEvent::ResolveEnd { .. }
        )
    }
}
