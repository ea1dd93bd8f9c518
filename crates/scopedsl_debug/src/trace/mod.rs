//! Evaluation tracing for scope resolution.
//!
//! A [`Tracer`] plugs into the engine's
//! [`ResolutionTracer`](scopedsl_engine::ResolutionTracer) seam. It is
//! disabled by default; while disabled the engine never reads the clock and
//! nothing is recorded.
//!
//! # Example
//!
//! ```text
//! > :trace on                      ;; Enable tracing
//! > items:inventory                ;; Resolve (events are recorded)
//! > :trace show                    ;; Print the report
//! > :trace off                     ;; Disable (records are kept)
//! > :trace clear                   ;; Drop recorded data
//! ```

pub mod buffer;
pub mod format;
pub mod record;
pub mod stats;

pub use buffer::{DEFAULT_BUFFER_SIZE, TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter, format_duration};
pub use record::TraceRecord;
pub use stats::{
    DEFAULT_SLOWEST_COUNT, FilterStats, OverheadEstimate, ResolverStats, SlowStep, TraceStats,
};

use std::time::Instant;

use scopedsl_engine::{ResolutionTracer, TraceEvent};
use tracing::debug;

// =============================================================================
// Tracer Configuration
// =============================================================================

/// Configuration for the tracer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracerConfig {
    /// Whether tracing is enabled.
    pub enabled: bool,
    /// Maximum records to keep in buffer.
    pub buffer_size: usize,
    /// Number of slowest steps to report.
    pub slowest_count: usize,
    /// Whether [`Tracer::format`] renders JSON.
    pub json_format: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            slowest_count: DEFAULT_SLOWEST_COUNT,
            json_format: false,
        }
    }
}

impl TracerConfig {
    /// Creates a new tracer configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to set how many slow steps are reported.
    #[must_use]
    pub fn with_slowest_count(mut self, count: usize) -> Self {
        self.slowest_count = count;
        self
    }

    /// Builder method to use JSON format.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }
}

// =============================================================================
// Trace Snapshot
// =============================================================================

/// A copy of everything recorded, plus statistics over it.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    /// Records, oldest first.
    pub records: Vec<TraceRecord>,
    /// Statistics over `records`.
    pub stats: TraceStats,
}

impl Trace {
    /// Returns only the resolver steps.
    pub fn steps(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter().filter(|r| r.is_step())
    }
}

// =============================================================================
// Tracer
// =============================================================================

/// Records resolution events into a bounded buffer.
///
/// States: disabled (default) and enabled. Disabling keeps recorded data;
/// [`Tracer::clear`] drops it.
#[derive(Debug)]
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    start_time: Instant,
    overhead: Option<OverheadEstimate>,
    human_formatter: HumanFormatter,
    json_formatter: JsonFormatter,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer_size = config.buffer_size;
        Self {
            config,
            buffer: TraceBuffer::new(buffer_size),
            start_time: Instant::now(),
            overhead: None,
            human_formatter: HumanFormatter::new(),
            json_formatter: JsonFormatter::new().pretty(),
        }
    }

    /// Creates a tracer with default configuration (disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Creates an enabled tracer.
    #[must_use]
    pub fn enabled() -> Self {
        Self::new(TracerConfig::new().enabled())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        if !self.config.enabled {
            debug!("tracing enabled");
        }
        self.config.enabled = true;
    }

    /// Disables tracing. Recorded data is kept.
    pub fn disable(&mut self) {
        if self.config.enabled {
            debug!(records = self.buffer.len(), "tracing disabled");
        }
        self.config.enabled = false;
    }

    /// Drops all recorded data, including the overhead estimate.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overhead = None;
    }

    /// Sets whether [`Tracer::format`] renders JSON.
    pub fn set_json_format(&mut self, json: bool) {
        self.config.json_format = json;
    }

    /// Stores a measured overhead estimate for reporting.
    pub fn set_overhead(&mut self, overhead: OverheadEstimate) {
        self.overhead = Some(overhead);
    }

    /// Returns the last measured overhead.
    #[must_use]
    pub fn overhead(&self) -> Option<OverheadEstimate> {
        self.overhead
    }

    /// Returns the trace buffer.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns a snapshot of the records and their statistics.
    #[must_use]
    pub fn trace(&self) -> Trace {
        Trace {
            records: self.buffer.iter().cloned().collect(),
            stats: self.stats(),
        }
    }

    /// Returns the recorded resolver steps.
    #[must_use]
    pub fn steps(&self) -> Vec<&TraceRecord> {
        self.buffer.filter(TraceRecord::is_step)
    }

    /// Computes statistics over the recorded events.
    #[must_use]
    pub fn stats(&self) -> TraceStats {
        TraceStats::from_records(self.buffer.iter(), self.config.slowest_count)
            .with_overhead(self.overhead)
    }

    /// Renders the report in the configured format.
    #[must_use]
    pub fn format(&self) -> String {
        if self.config.json_format {
            self.format_json()
        } else {
            let records: Vec<&TraceRecord> = self.buffer.iter().collect();
            self.human_formatter.format_report(&records, &self.stats())
        }
    }

    /// Renders the report as JSON.
    #[must_use]
    pub fn format_json(&self) -> String {
        let records: Vec<&TraceRecord> = self.buffer.iter().collect();
        self.json_formatter.format_report(&records, &self.stats())
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ResolutionTracer for Tracer {
    #[inline]
    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn record(&mut self, event: TraceEvent) {
        if !self.config.enabled {
            return;
        }
        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        self.buffer.push(timestamp_ns, event);
    }
}

// =============================================================================
// Tests
// =============================================================================
