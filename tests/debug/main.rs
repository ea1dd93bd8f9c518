//! Integration tests for Layer 4: Debug
//!
//! Tests for the tracer (recording, eviction, statistics, reports) and the
//! profiler (overhead measurement and tracer state handling).

mod profiling;
