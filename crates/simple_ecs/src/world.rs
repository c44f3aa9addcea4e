//! Entity identity, allocation, and generational recycling.
//!
//! The [`EntityWorld`] is the single source of truth for which entity handles
//! are valid. It stores one slot per id ever issued; each slot records the
//! version of the most recent entity created at that id and whether that
//! entity is still alive. Destroyed ids are queued FIFO and reissued with the
//! next version, so a stale handle can always be told apart from its successor.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::entity::{Entity, WorldId};

/// A destroyed `(id, version)` pair waiting to be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecycledSlot {
    id: u32,
    version: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    version: u32,
    alive: bool,
}

/// Owns entity identity and liveness.
#[derive(Debug)]
pub struct EntityWorld {
    id: WorldId,
    /// Indexed by entity id. Slot 0 is reserved for [`Entity::NULL`] and never
    /// becomes alive.
    slots: Vec<Slot>,
    recycled: VecDeque<RecycledSlot>,
    /// Highest id ever issued.
    current_id: u32,
    alive: usize,
}

impl EntityWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty world with room for `capacity` entities before the slot
    /// array has to grow.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.push(Slot::default());
        Self {
            id: WorldId::next(),
            slots,
            recycled: VecDeque::new(),
            current_id: 0,
            alive: 0,
        }
    }

    /// Returns this world's id, stamped on every entity it issues.
    #[must_use]
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Create a new entity.
    ///
    /// The oldest recycled id is reused first, with its version bumped. When
    /// nothing is waiting a fresh id is allocated at version 0.
    pub fn create_entity(&mut self) -> Entity {
        let entity = if let Some(recycled) = self.recycled.pop_front() {
            let version = recycled.version.wrapping_add(1);
            let slot = &mut self.slots[recycled.id as usize];
            slot.version = version;
            slot.alive = true;
            trace!(id = recycled.id, version, "reused recycled entity id");
            Entity::new(recycled.id, version, self.id)
        } else {
            self.current_id += 1;
            self.slots.push(Slot {
                version: 0,
                alive: true,
            });
            Entity::new(self.current_id, 0, self.id)
        };
        self.alive += 1;
        entity
    }

    /// Returns the live entity at `id`, or [`Entity::NULL`] if none.
    #[must_use]
    pub fn entity_by_id(&self, id: u32) -> Entity {
        match self.slots.get(id as usize) {
            Some(slot) if slot.alive => Entity::new(id, slot.version, self.id),
            _ => Entity::NULL,
        }
    }

    /// Returns `true` if `entity` was issued by this world and is still the
    /// current occupant of its slot.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.world() == self.id
            && self
                .slots
                .get(entity.id() as usize)
                .is_some_and(|slot| slot.alive && slot.version == entity.version())
    }

    /// Mark `entity` destroyed and queue its id for reuse.
    ///
    /// The owning manager calls this exactly once per destruction and notifies
    /// the [`QueryCache`](crate::QueryCache) separately. Stale or foreign
    /// handles are ignored so an id is never queued twice. Returns `true` if
    /// the entity was alive.
    pub fn on_entity_destroyed(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            debug!(%entity, "ignoring destruction of entity that is not alive");
            return false;
        }
        self.slots[entity.id() as usize].alive = false;
        self.alive -= 1;
        self.recycled.push_back(RecycledSlot {
            id: entity.id(),
            version: entity.version(),
        });
        true
    }

    /// Destroy every live entity.
    ///
    /// `on_destroyed` runs for each entity while it is still alive, so the
    /// caller can tear down its components and notify other listeners. The id
    /// counter is left as is.
    pub fn destroy_all(&mut self, mut on_destroyed: impl FnMut(Entity)) {
        let live: Vec<Entity> = self.entities().collect();
        for entity in live {
            on_destroyed(entity);
            self.on_entity_destroyed(entity);
        }
        debug!(recycled = self.recycled.len(), "destroyed all entities");
    }

    /// Returns the highest entity id issued so far.
    #[must_use]
    pub fn max_entity_id(&self) -> u32 {
        self.current_id
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Returns `true` if no entity is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Returns the number of ids waiting to be reused.
    #[must_use]
    pub fn recycled_len(&self) -> usize {
        self.recycled.len()
    }

    /// Iterate over all live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.alive)
            .map(|(id, slot)| Entity::new(id as u32, slot.version, self.id))
    }
}

impl Default for EntityWorld {
    fn default() -> Self {
        Self::new()
    }
}
