//! Persistent in-memory entity/component world for ScopeDSL.
//!
//! This crate provides:
//! - [`World`] - Immutable world state with structural sharing, implementing
//!   [`EntityManager`](scopedsl_foundation::EntityManager)
//! - [`ComponentIndex`] - Component → entities index for `entities(...)` sources

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod world;

pub use component::ComponentIndex;
pub use world::World;
