//! Entity handles.
//!
//! An [`Entity`] is a generational `(id, version)` pair with no inherent data.
//! It also remembers which [`WorldId`] issued it, but that is only a label: the
//! world owns its entities, entities never own the world.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

/// Non-owning handle naming an [`EntityWorld`](crate::EntityWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(u32);

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

impl WorldId {
    /// Sentinel for "no world", carried by [`Entity::NULL`].
    pub const NONE: WorldId = WorldId(0);

    /// Hands out a fresh, process-unique world id.
    pub(crate) fn next() -> Self {
        Self(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A generational entity handle.
///
/// Two handles are equal iff their id and version match. A handle captured
/// before its entity was destroyed keeps the old version and therefore never
/// aliases a newer entity created at the same id.
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    id: u32,
    version: u32,
    world: WorldId,
}

impl Entity {
    /// The null entity: "no entity". Id 0 is never issued by a world.
    pub const NULL: Entity = Entity {
        id: 0,
        version: 0,
        world: WorldId::NONE,
    };

    pub(crate) const fn new(id: u32, version: u32, world: WorldId) -> Self {
        Self { id, version, world }
    }

    /// Returns the slot id.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Returns the version of the slot at the time this handle was issued.
    #[must_use]
    pub const fn version(self) -> u32 {
        self.version
    }

    /// Returns the world that issued this handle.
    #[must_use]
    pub const fn world(self) -> WorldId {
        self.world
    }

    /// Returns `true` for [`Entity::NULL`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.id == 0 && self.version == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.version.hash(state);
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.id, self.version)
        }
    }
}
