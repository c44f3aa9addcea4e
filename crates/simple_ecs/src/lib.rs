//! # simple_ecs
//!
//! Entity lifecycle and cached queries for a small entity-component system.
//!
//! This crate provides:
//!
//! - [`Entity`]: generational `(id, version)` handles with O(1) validity checks.
//! - [`EntityWorld`]: allocation with FIFO id recycling.
//! - [`Filter`] / [`QueryCache`]: deduplicated include/exclude queries whose
//!   match sets are kept up to date one component change at a time.
//! - [`Components`]: per-type component pools and per-entity masks.
//! - [`Ecs`]: the owning manager that keeps all of the above consistent.
//!
//! Everything runs on one thread; mutation goes through `&mut`.

pub mod cache;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod manager;
pub mod mask;
pub mod query;
pub mod storage;
pub mod world;

pub use cache::QueryCache;
pub use component::{Component, ComponentIndex, ComponentMeta, ComponentRegistry, TypeRegistry};
pub use config::EcsConfig;
pub use entity::{Entity, WorldId};
pub use error::EcsError;
pub use filter::{Filter, FilterId};
pub use manager::Ecs;
pub use mask::ComponentMask;
pub use query::{FilterBuilder, QueryFilter};
pub use storage::{ComponentStorage, Components};
pub use world::EntityWorld;
