//! Integration tests for Layer 3: Engine
//!
//! Tests for scope registration, resolution through every resolver,
//! error classification, and the algebraic properties of resolution.

mod errors;
mod resolution;
