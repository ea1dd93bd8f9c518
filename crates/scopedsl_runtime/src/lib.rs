//! REPL, CLI, and world snapshots for ScopeDSL.
//!
//! This crate provides:
//! - [`Repl`] - Interactive read-eval-print loop over scope expressions
//! - [`Session`] - Engine, world, actor, and tracer held together
//! - World snapshot loading and saving (JSON and `MessagePack`)
//! - Logging setup for the `scopedsl` binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod logging;
pub mod repl;
pub mod serialize;
pub mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::{Command, Outcome, Repl, TraceAction, format_set};
pub use serialize::{
    SnapshotFormat, from_bytes, from_json, load_from_file, save_to_file, to_bytes, to_json,
};
pub use session::{Evaluation, Loaded, Session};
