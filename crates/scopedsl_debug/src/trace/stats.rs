//! Aggregated trace statistics.
//!
//! Percentages are computed over the sum of exclusive times: every resolver's
//! self time plus the time spent evaluating filters. Each slice of wall time is
//! therefore counted once, and the shares add up to 100%.

use std::collections::BTreeMap;
use std::time::Duration;

use scopedsl_engine::TraceEvent;

use super::record::TraceRecord;

/// Default number of slowest steps kept.
pub const DEFAULT_SLOWEST_COUNT: usize = 5;

fn average(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    total / u32::try_from(count).unwrap_or(u32::MAX)
}

fn percentage(part: Duration, whole: Duration) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    part.as_secs_f64() / whole.as_secs_f64() * 100.0
}

// =============================================================================
// Per-resolver and filter statistics
// =============================================================================

/// Timing for one resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverStats {
    /// Resolver name.
    pub name: &'static str,
    /// Number of steps.
    pub count: usize,
    /// Sum of exclusive times.
    pub self_time: Duration,
    /// Sum of inclusive times.
    pub inclusive_time: Duration,
}

impl ResolverStats {
    /// Average exclusive time per step.
    #[must_use]
    pub fn average(&self) -> Duration {
        average(self.self_time, self.count)
    }
}

/// Filter evaluation totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Number of evaluations.
    pub count: usize,
    /// Number of candidates kept.
    pub passed: usize,
    /// Total evaluation time.
    pub total_time: Duration,
}

impl FilterStats {
    /// Average time per evaluation.
    #[must_use]
    pub fn average(&self) -> Duration {
        average(self.total_time, self.count)
    }

    /// Fraction of candidates kept, in `[0, 1]`.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.passed as f64 / self.count as f64;
        rate
    }
}

/// One of the slowest resolver steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlowStep {
    /// Record id of the step.
    pub record_id: u64,
    /// Resolver name.
    pub resolver: &'static str,
    /// Scope in which the step ran.
    pub scope_id: Option<String>,
    /// Inclusive time.
    pub duration: Duration,
    /// Candidates produced.
    pub result_size: usize,
}

/// Measured cost of tracing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverheadEstimate {
    /// Uninstrumented run time.
    pub baseline: Duration,
    /// Instrumented run time.
    pub instrumented: Duration,
    /// `max(0, instrumented - baseline) / instrumented * 100`.
    pub percent: f64,
}

impl OverheadEstimate {
    /// Computes the estimate from two runs.
    #[must_use]
    pub fn from_runs(baseline: Duration, instrumented: Duration) -> Self {
        Self {
            baseline,
            instrumented,
            percent: percentage(instrumented.saturating_sub(baseline), instrumented),
        }
    }
}

// =============================================================================
// Trace Statistics
// =============================================================================

/// Statistics over a set of trace records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceStats {
    /// Per-resolver timing, slowest (by self time) first.
    pub resolvers: Vec<ResolverStats>,
    /// Filter evaluation totals.
    pub filters: FilterStats,
    /// Slowest steps by inclusive time; ties keep insertion order.
    pub slowest: Vec<SlowStep>,
    /// Completed resolutions.
    pub resolutions: usize,
    /// Resolutions that returned an error.
    pub failures: usize,
    /// Error events.
    pub errors: usize,
    /// Sum of top-level resolution times.
    pub total_time: Duration,
    /// Tracing overhead, if measured.
    pub overhead: Option<OverheadEstimate>,
}

impl TraceStats {
    /// Aggregates records, keeping the `slowest_count` slowest steps.
    #[must_use]
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a TraceRecord>,
        slowest_count: usize,
    ) -> Self {
        let mut stats = Self::default();
        let mut resolvers: BTreeMap<&'static str, ResolverStats> = BTreeMap::new();
        let mut steps = Vec::new();

        for record in records {
            match &record.event {
                TraceEvent::ResolverStep {
                    resolver,
                    scope_id,
                    duration,
                    self_duration,
                    result_size,
                } => {
                    let entry = resolvers.entry(*resolver).or_insert(ResolverStats {
                        name: *resolver,
                        count: 0,
                        self_time: Duration::ZERO,
                        inclusive_time: Duration::ZERO,
                    });
                    entry.count += 1;
                    entry.self_time += *self_duration;
                    entry.inclusive_time += *duration;
                    steps.push(SlowStep {
                        record_id: record.id,
                        resolver: *resolver,
                        scope_id: scope_id.clone(),
                        duration: *duration,
                        result_size: *result_size,
                    });
                }
                TraceEvent::FilterEvaluation {
                    duration, passed, ..
                } => {
                    stats.filters.count += 1;
                    stats.filters.total_time += *duration;
                    if *passed {
                        stats.filters.passed += 1;
                    }
                }
                TraceEvent::ResolveEnd {
                    success, duration, ..
                } => {
                    stats.resolutions += 1;
                    stats.total_time += *duration;
                    if !*success {
                        stats.failures += 1;
                    }
                }
                TraceEvent::Error { .. } => stats.errors += 1,
                TraceEvent::ResolveStart { .. } => {}
            }
        }

        // Stable sort: equal durations keep insertion order.
        steps.sort_by(|a, b| b.duration.cmp(&a.duration));
        steps.truncate(slowest_count);
        stats.slowest = steps;

        stats.resolvers = resolvers.into_values().collect();
        stats
            .resolvers
            .sort_by(|a, b| b.self_time.cmp(&a.self_time).then(a.name.cmp(b.name)));
        stats
    }

    /// Attaches an overhead estimate.
    #[must_use]
    pub fn with_overhead(mut self, overhead: Option<OverheadEstimate>) -> Self {
        self.overhead = overhead;
        self
    }

    /// Sum of every resolver's self time plus filter time.
    #[must_use]
    pub fn exclusive_total(&self) -> Duration {
        self.resolvers.iter().map(|r| r.self_time).sum::<Duration>() + self.filters.total_time
    }

    /// Total number of resolver steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.resolvers.iter().map(|r| r.count).sum()
    }

    /// Returns stats for one resolver.
    #[must_use]
    pub fn resolver(&self, name: &str) -> Option<&ResolverStats> {
        self.resolvers.iter().find(|r| r.name == name)
    }

    /// Share of exclusive time spent in one resolver, in percent.
    #[must_use]
    pub fn resolver_percentage(&self, name: &str) -> f64 {
        self.resolver(name)
            .map_or(0.0, |r| percentage(r.self_time, self.exclusive_total()))
    }

    /// Share of exclusive time spent evaluating filters, in percent.
    #[must_use]
    pub fn filter_percentage(&self) -> f64 {
        percentage(self.filters.total_time, self.exclusive_total())
    }

    /// Every resolver's share followed by the filter share.
    #[must_use]
    pub fn percentages(&self) -> Vec<(&'static str, f64)> {
        let total = self.exclusive_total();
        self.resolvers
            .iter()
            .map(|r| (r.name, percentage(r.self_time, total)))
            .chain(std::iter::once((
                "FilterEvaluation",
                percentage(self.filters.total_time, total),
            )))
            .collect()
    }
}
