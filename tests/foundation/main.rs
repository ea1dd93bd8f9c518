//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: EntityId, EntityView, path walking, and errors.

mod entities;
mod errors;
