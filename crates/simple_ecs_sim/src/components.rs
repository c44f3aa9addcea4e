//! Components used by the simulation.
//!
//! Spatial data uses [`glam`] vectors, the same way the engine's math types do.

use glam::Vec3;
use simple_ecs::Component;

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec3);

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Marker: the entity is temporarily excluded from movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frozen;

impl Component for Frozen {
    fn type_name() -> &'static str {
        "Frozen"
    }
}

/// Remaining ticks before the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    /// Ticks left, counting down to zero.
    pub remaining: u32,
}

impl Component for Lifetime {
    fn type_name() -> &'static str {
        "Lifetime"
    }
}

impl Position {
    /// Advance by `velocity` over `dt` seconds.
    #[must_use]
    pub fn advanced(self, velocity: Velocity, dt: f32) -> Self {
        Self(self.0 + velocity.0 * dt)
    }
}
