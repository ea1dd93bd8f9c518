//! Evaluation tracing and profiling for ScopeDSL.
//!
//! This crate provides:
//! - [`Tracer`] - Records resolver steps and filter evaluations
//! - [`TraceStats`] - Per-resolver timing, filter breakdown, slowest steps
//! - [`Profiler`] - Baseline vs. instrumented overhead measurement
//! - [`DebugConfig`] - Presets for development and profiling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod profile;
pub mod trace;

pub use config::DebugConfig;
pub use profile::{ProfileReport, Profiler};
pub use trace::{
    HumanFormatter, JsonFormatter, OverheadEstimate, Trace, TraceBuffer, TraceFormatter,
    TraceRecord, TraceStats, Tracer, TracerConfig,
};
