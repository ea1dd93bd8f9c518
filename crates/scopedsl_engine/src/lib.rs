//! Scope resolution engine for ScopeDSL.
//!
//! This crate provides:
//! - [`ScopeEngine`] - Scope registration and resolution entry points
//! - [`ResolverRegistry`] / [`NodeResolver`] - One resolver per AST node kind
//! - [`ErrorHandler`] - Error classification and a bounded error log
//! - [`ResolutionTracer`] - The seam tracers plug into
//!
//! # Example
//!
//! ```
//! use scopedsl_engine::{ActorContext, ScopeEngine};
//! use scopedsl_storage::World;
//! use serde_json::json;
//!
//! let world = World::new()
//!     .with_entity("hero", [("core:inventory", json!({"items": ["sword"]}))])
//!     .with_entity("sword", [("core:item", json!({}))]);
//!
//! let mut engine = ScopeEngine::new();
//! engine
//!     .register_scope_source("items:inventory", "actor.core:inventory.items[]")
//!     .unwrap();
//!
//! let items = engine
//!     .resolve("items:inventory", &ActorContext::new("hero"), &world)
//!     .unwrap();
//! assert!(items.contains("sword"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod candidate;
pub mod config;
pub mod context;
pub mod engine;
pub mod error_handler;
pub mod registry;
pub mod resolver;
pub mod trace;

pub use candidate::CandidateSet;
pub use config::EngineConfig;
pub use context::{ActorContext, ResolutionContext};
pub use engine::ScopeEngine;
pub use error_handler::{ErrorBuffer, ErrorHandler, ErrorRecord};
pub use registry::ScopeRegistry;
pub use resolver::{
    ArrayIterateResolver, Dispatcher, FilterResolver, NodeResolver, PropertyAccessResolver,
    ResolverRegistry, SourceRefResolver, UnionResolver,
};
pub use trace::{NoopTracer, ResolutionTracer, TraceEvent};
