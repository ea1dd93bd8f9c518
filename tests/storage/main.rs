//! Integration tests for Layer 1: Storage
//!
//! Tests for the reference World: entity lifecycle, components, and the
//! EntityManager view the engine resolves against.

mod entities;
