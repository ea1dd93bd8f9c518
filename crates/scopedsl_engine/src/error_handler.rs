//! Error reporting and aggregation.
//!
//! The [`ErrorHandler`] classifies every reported [`Error`] into an
//! [`ErrorCategory`], logs it, and keeps the most recent records in a bounded
//! ring buffer for later queries.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;
use scopedsl_foundation::{Error, ErrorCategory};
use tracing::warn;

use crate::config::DEFAULT_ERROR_BUFFER_SIZE;

// =============================================================================
// Error Record
// =============================================================================

/// One reported error.
#[derive(Clone, Debug)]
pub struct ErrorRecord {
    /// Reporting category.
    pub category: ErrorCategory,
    /// Stable error code (`SCOPE_2002`, ...).
    pub code: &'static str,
    /// Rendered message.
    pub message: String,
    /// Scope in which the error occurred, if known.
    pub scope_id: Option<String>,
    /// Wall-clock time of the report.
    pub timestamp: SystemTime,
    recorded_at: Instant,
}

impl ErrorRecord {
    fn new(error: &Error, scope_id: Option<&str>) -> Self {
        let category = error.category();
        Self {
            category,
            code: category.code(),
            message: error.to_string(),
            scope_id: scope_id
                .or_else(|| error.scope_id())
                .map(str::to_string),
            timestamp: SystemTime::now(),
            recorded_at: Instant::now(),
        }
    }

    /// Returns how long ago this error was reported.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.recorded_at.elapsed()
    }
}

// =============================================================================
// Error Buffer
// =============================================================================

/// A ring buffer of error records.
///
/// Keeps at most `max_size` records, discarding the oldest when full.
#[derive(Clone, Debug)]
pub struct ErrorBuffer {
    /// The records, oldest first.
    records: VecDeque<ErrorRecord>,
    /// Maximum number of records to keep.
    max_size: usize,
    /// Total records ever pushed, including evicted ones.
    total: u64,
}

impl ErrorBuffer {
    /// Creates a new buffer with the given maximum size.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            total: 0,
        }
    }

    /// Appends a record, evicting the oldest if over capacity.
    pub fn push(&mut self, record: ErrorRecord) {
        self.total += 1;
        self.records.push_back(record);
        while self.records.len() > self.max_size {
            self.records.pop_front();
        }
    }

    /// Returns the number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the capacity.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the number of records ever pushed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Drops every retained record. The running total is kept.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns an iterator over retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    /// Returns the most recent `count` records, newest last.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&ErrorRecord> {
        let start = self.records.len().saturating_sub(count);
        self.records.iter().skip(start).collect()
    }
}

impl Default for ErrorBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_BUFFER_SIZE)
    }
}

// =============================================================================
// Error Handler
// =============================================================================

/// Thread-safe error classifier and store.
#[derive(Debug)]
pub struct ErrorHandler {
    buffer: Mutex<ErrorBuffer>,
}

impl ErrorHandler {
    /// Creates a handler with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ERROR_BUFFER_SIZE)
    }

    /// Creates a handler retaining at most `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(ErrorBuffer::new(capacity)),
        }
    }

    /// Classifies, records, and logs an error.
    ///
    /// `scope_id` overrides the scope recorded in the error's context.
    pub fn report(&self, error: &Error, scope_id: Option<&str>) -> ErrorCategory {
        let record = ErrorRecord::new(error, scope_id);
        let category = record.category;
        warn!(
            code = record.code,
            category = category.name(),
            scope = record.scope_id.as_deref().unwrap_or("-"),
            "{}",
            record.message
        );
        self.buffer.lock().push(record);
        category
    }

    /// Returns the most recent `count` records, newest last.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<ErrorRecord> {
        self.buffer.lock().recent(count).into_iter().cloned().collect()
    }

    /// Returns retained record counts per category.
    ///
    /// Categories with no records are omitted.
    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<ErrorCategory, usize> {
        let mut counts = BTreeMap::new();
        for record in self.buffer.lock().iter() {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of retained records in one category.
    #[must_use]
    pub fn count(&self, category: ErrorCategory) -> usize {
        self.buffer
            .lock()
            .iter()
            .filter(|r| r.category == category)
            .count()
    }

    /// Returns retained records per second reported within `window`.
    #[must_use]
    pub fn rate(&self, window: Duration) -> f64 {
        if window.is_zero() {
            return 0.0;
        }
        let recent = self
            .buffer
            .lock()
            .iter()
            .filter(|r| r.age() <= window)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let recent = recent as f64;
        recent / window.as_secs_f64()
    }

    /// Returns the number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Returns true if no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Returns the number of errors ever reported, including evicted ones.
    #[must_use]
    pub fn total_reported(&self) -> u64 {
        self.buffer.lock().total()
    }

    /// Drops all retained records.
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// Renders a per-category summary followed by the latest records.
    #[must_use]
    pub fn format_summary(&self) -> String {
        let buffer = self.buffer.lock();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Errors: {} retained, {} reported",
            buffer.len(),
            buffer.total()
        );

        let mut counts: BTreeMap<ErrorCategory, usize> = BTreeMap::new();
        for record in buffer.iter() {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        for (category, count) in &counts {
            let _ = writeln!(out, "  {} ({}): {count}", category.name(), category.code());
        }

        let latest = buffer.recent(5);
        if !latest.is_empty() {
            let _ = writeln!(out, "Latest:");
            for record in latest {
                let scope = record.scope_id.as_deref().unwrap_or("-");
                let _ = writeln!(out, "  [{}] {scope}: {}", record.code, record.message);
            }
        }
        out
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}
