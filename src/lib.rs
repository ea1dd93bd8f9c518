//! ScopeDSL - Scope resolution over entity/component worlds
//!
//! This crate re-exports all layers of the ScopeDSL system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: scopedsl_runtime    — REPL, CLI, world snapshots
//! Layer 4: scopedsl_debug      — Evaluation tracing, statistics, profiling
//! Layer 3: scopedsl_engine     — Resolver registry, scope engine, error handler
//! Layer 2: scopedsl_language   — Lexer, parser, JSON-Logic filter evaluator
//! Layer 1: scopedsl_storage    — Reference entity/component world
//! Layer 0: scopedsl_foundation — Core types (EntityId, EntityView, Error)
//! ```

pub use scopedsl_debug as debug;
pub use scopedsl_engine as engine;
pub use scopedsl_foundation as foundation;
pub use scopedsl_language as language;
pub use scopedsl_runtime as runtime;
pub use scopedsl_storage as storage;
