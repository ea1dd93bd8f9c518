//! End-to-end tests across every layer.
//!
//! Scenarios run definitions text through the parser, the engine, and the
//! tracer against a small world; the session tests drive the runtime the way
//! the `scopedsl` binary does.

mod scenarios;
mod session;
