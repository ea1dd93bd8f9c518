//! Core types, entity views, and errors for ScopeDSL.
//!
//! This crate provides:
//! - [`EntityId`] - Cheaply clonable entity identifiers
//! - [`EntityView`] - Read-only projection of an entity's components
//! - [`EntityManager`] - The storage seam the engine reads through
//! - [`Error`] - Categorized error types with context
//! - [`path`] - Nullable path resolution over component data

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod path;

pub use entity::{ComponentMap, EntityId, EntityManager, EntitySet, EntityView};
pub use error::{Error, ErrorCategory, ErrorContext, ErrorKind, Result};

/// Re-export of the JSON value type used for all component data.
pub use serde_json::Value as JsonValue;
