//! Error types for the manager surface and configuration loading.
//!
//! The world, cache, and filters never fail; these errors only come from
//! [`Ecs`](crate::Ecs) component operations and [`EcsConfig`](crate::EcsConfig).

use crate::entity::Entity;

/// Errors returned by [`Ecs`](crate::Ecs) and [`EcsConfig`](crate::EcsConfig).
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The handle is null, stale, or from another world.
    #[error("{0} is not alive")]
    EntityNotAlive(Entity),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
