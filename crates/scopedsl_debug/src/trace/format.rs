//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records and for the
//! summary report built from [`TraceStats`].

use std::fmt::Write;
use std::time::Duration;

use scopedsl_engine::TraceEvent;
use serde_json::{Value as JsonValue, json};

use super::record::TraceRecord;
use super::stats::TraceStats;

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats a full report: records plus statistics.
    fn format_report(&self, records: &[&TraceRecord], stats: &TraceStats) -> String;
}

/// Formats a duration with a unit suited to its size.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let ns = duration.as_nanos();
    if ns >= 1_000_000_000 {
        format!("{:.3}s", ns as f64 / 1_000_000_000.0)
    } else if ns >= 1_000_000 {
        format!("{:.3}ms", ns as f64 / 1_000_000.0)
    } else if ns >= 1000 {
        format!("{:.3}us", ns as f64 / 1000.0)
    } else {
        format!("{ns}ns")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut prefix = String::new();
        if self.show_ids {
            let _ = write!(prefix, "[{:06}] ", record.id);
        }
        if self.show_timestamps {
            let _ = write!(
                prefix,
                "{:>12} ",
                format_duration(Duration::from_nanos(record.timestamp_ns))
            );
        }

        let event = match &record.event {
            TraceEvent::ResolveStart { scope_id, actor } => {
                format!("=== RESOLVE {scope_id} (actor {actor}) ===")
            }
            TraceEvent::ResolveEnd {
                scope_id,
                result_size,
                success,
                duration,
            } => {
                let status = if *success { "OK" } else { "FAILED" };
                format!(
                    "=== END {scope_id} ({status}, {result_size} entities, {}) ===",
                    format_duration(*duration)
                )
            }
            TraceEvent::ResolverStep {
                resolver,
                scope_id,
                duration,
                self_duration,
                result_size,
            } => {
                let scope = scope_id
                    .as_deref()
                    .map(|s| format!(" [{s}]"))
                    .unwrap_or_default();
                format!(
                    "  {resolver}{scope} -> {result_size} in {} (self {})",
                    format_duration(*duration),
                    format_duration(*self_duration)
                )
            }
            TraceEvent::FilterEvaluation {
                entity,
                duration,
                passed,
            } => {
                let status = if *passed { "PASS" } else { "FAIL" };
                let subject = entity
                    .as_ref()
                    .map_or_else(|| "<value>".to_string(), ToString::to_string);
                format!("    filter {subject} {status} ({})", format_duration(*duration))
            }
            TraceEvent::Error { category, message } => {
                format!("  ERROR {}: {message}", category.name())
            }
        };

        format!("{prefix}{event}")
    }

    fn format_report(&self, records: &[&TraceRecord], stats: &TraceStats) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== Scope Resolution Trace ===");
        let _ = writeln!(
            out,
            "Resolutions: {} ({} failed), {} steps, {} filter evaluations, {} errors",
            stats.resolutions,
            stats.failures,
            stats.step_count(),
            stats.filters.count,
            stats.errors
        );
        let _ = writeln!(out, "Total time: {}", format_duration(stats.total_time));
        if !records.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", self.format_many(records));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "--- Resolver Timing ---");
        let total = stats.exclusive_total();
        for resolver in &stats.resolvers {
            let _ = writeln!(
                out,
                "  {:<24} {:>5} calls  self {:>12}  avg {:>12}  {:>6.2}%",
                resolver.name,
                resolver.count,
                format_duration(resolver.self_time),
                format_duration(resolver.average()),
                stats.resolver_percentage(resolver.name)
            );
        }
        if stats.resolvers.is_empty() {
            let _ = writeln!(out, "  (no resolver steps)");
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "--- Filter Evaluation ---");
        let _ = writeln!(
            out,
            "  {} evaluations, {} passed ({:.1}%), total {}, avg {}, {:.2}% of {}",
            stats.filters.count,
            stats.filters.passed,
            stats.filters.pass_rate() * 100.0,
            format_duration(stats.filters.total_time),
            format_duration(stats.filters.average()),
            stats.filter_percentage(),
            format_duration(total)
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "--- Slowest Operations ---");
        for (rank, step) in stats.slowest.iter().enumerate() {
            let scope = step.scope_id.as_deref().unwrap_or("-");
            let _ = writeln!(
                out,
                "  {}. {} [{scope}] {} ({} results)",
                rank + 1,
                step.resolver,
                format_duration(step.duration),
                step.result_size
            );
        }
        if stats.slowest.is_empty() {
            let _ = writeln!(out, "  (none)");
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "--- Overhead ---");
        match &stats.overhead {
            Some(overhead) => {
                let _ = writeln!(
                    out,
                    "  baseline {}, instrumented {}, overhead {:.2}%",
                    format_duration(overhead.baseline),
                    format_duration(overhead.instrumented),
                    overhead.percent
                );
            }
            None => {
                let _ = writeln!(out, "  not measured");
            }
        }
        out
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to pretty-print JSON.
    pub pretty: bool,
}

#[allow(clippy::cast_possible_truncation)]
fn nanos(duration: Duration) -> u64 {
    duration.as_nanos() as u64
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for pretty printing.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render(&self, value: &JsonValue) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| value.to_string())
    }

    /// Converts a record to a JSON value.
    #[must_use]
    pub fn record_json(record: &TraceRecord) -> JsonValue {
        let mut value = match &record.event {
            TraceEvent::ResolveStart { scope_id, actor } => json!({
                "scope_id": scope_id,
                "actor": actor.as_str(),
            }),
            TraceEvent::ResolveEnd {
                scope_id,
                result_size,
                success,
                duration,
            } => json!({
                "scope_id": scope_id,
                "result_size": result_size,
                "success": success,
                "duration_ns": nanos(*duration),
            }),
            TraceEvent::ResolverStep {
                resolver,
                scope_id,
                duration,
                self_duration,
                result_size,
            } => json!({
                "resolver": resolver,
                "scope_id": scope_id,
                "duration_ns": nanos(*duration),
                "self_ns": nanos(*self_duration),
                "result_size": result_size,
            }),
            TraceEvent::FilterEvaluation {
                entity,
                duration,
                passed,
            } => json!({
                "entity": entity.as_ref().map(|e| e.as_str()),
                "duration_ns": nanos(*duration),
                "passed": passed,
            }),
            TraceEvent::Error { category, message } => json!({
                "category": category.name(),
                "code": category.code(),
                "message": message,
            }),
        };
        if let JsonValue::Object(map) = &mut value {
            map.insert("id".into(), json!(record.id));
            map.insert("timestamp_ns".into(), json!(record.timestamp_ns));
            map.insert("type".into(), json!(record.event_type()));
        }
        value
    }

    /// Converts statistics to a JSON value.
    #[must_use]
    pub fn stats_json(stats: &TraceStats) -> JsonValue {
        let resolvers: Vec<JsonValue> = stats
            .resolvers
            .iter()
            .map(|r| {
                json!({
                    "name": r.name,
                    "count": r.count,
                    "self_ns": nanos(r.self_time),
                    "average_ns": nanos(r.average()),
                    "percent": stats.resolver_percentage(r.name),
                })
            })
            .collect();
        let slowest: Vec<JsonValue> = stats
            .slowest
            .iter()
            .map(|s| {
                json!({
                    "record_id": s.record_id,
                    "resolver": s.resolver,
                    "scope_id": s.scope_id,
                    "duration_ns": nanos(s.duration),
                    "result_size": s.result_size,
                })
            })
            .collect();
        let overhead = stats.overhead.map(|o| {
            json!({
                "baseline_ns": nanos(o.baseline),
                "instrumented_ns": nanos(o.instrumented),
                "percent": o.percent,
            })
        });
        json!({
            "resolutions": stats.resolutions,
            "failures": stats.failures,
            "errors": stats.errors,
            "total_ns": nanos(stats.total_time),
            "resolvers": resolvers,
            "filters": {
                "count": stats.filters.count,
                "passed": stats.filters.passed,
                "total_ns": nanos(stats.filters.total_time),
                "average_ns": nanos(stats.filters.average()),
                "percent": stats.filter_percentage(),
            },
            "slowest": slowest,
            "overhead": overhead,
        })
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        self.render(&Self::record_json(record))
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let items: Vec<JsonValue> = records.iter().map(|r| Self::record_json(r)).collect();
        self.render(&JsonValue::Array(items))
    }

    fn format_report(&self, records: &[&TraceRecord], stats: &TraceStats) -> String {
        let items: Vec<JsonValue> = records.iter().map(|r| Self::record_json(r)).collect();
        self.render(&json!({
            "records": items,
            "stats": Self::stats_json(stats),
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================
