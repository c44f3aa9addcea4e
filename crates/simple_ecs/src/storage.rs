//! Component storage.
//!
//! [`Components`] keeps one sparse pool per component type, indexed by entity
//! id, and a [`ComponentMask`] per entity so that "does this entity have
//! component N" is a bit test. Filters only see the [`ComponentStorage`]
//! trait.

use std::any::Any;

use crate::component::{Component, ComponentIndex, ComponentRegistry, TypeRegistry};
use crate::entity::Entity;
use crate::mask::ComponentMask;

/// Answers membership questions for the query cache.
pub trait ComponentStorage: ComponentRegistry {
    /// Returns `true` if `entity` currently has the component at `index`.
    fn has_component(&self, entity: Entity, index: ComponentIndex) -> bool;
}

/// Type-erased view of a [`Pool`], used when tearing down an entity.
trait AnyPool: Any + Send + Sync {
    fn remove_slot(&mut self, id: u32);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Values of one component type, indexed by entity id.
struct Pool<T> {
    values: Vec<Option<T>>,
}

impl<T> Pool<T> {
    fn new() -> Self {
        Self { values: Vec::new() }
    }

    fn insert(&mut self, id: u32, value: T) -> Option<T> {
        let id = id as usize;
        if id >= self.values.len() {
            self.values.resize_with(id + 1, || None);
        }
        self.values[id].replace(value)
    }

    fn take(&mut self, id: u32) -> Option<T> {
        self.values.get_mut(id as usize).and_then(Option::take)
    }
}

impl<T: Send + Sync + 'static> AnyPool for Pool<T> {
    fn remove_slot(&mut self, id: u32) {
        self.take(id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Which components the current occupant of an entity slot has.
#[derive(Debug, Default, Clone)]
struct EntityComponents {
    version: u32,
    mask: ComponentMask,
}

/// Concrete component storage used by [`Ecs`](crate::Ecs).
#[derive(Default)]
pub struct Components {
    registry: TypeRegistry,
    pools: Vec<Box<dyn AnyPool>>,
    /// Indexed by entity id.
    entries: Vec<EntityComponents>,
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components")
            .field("registry", &self.registry)
            .field("pools", &self.pools.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Components {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty storage with room for `entities` entity slots.
    #[must_use]
    pub fn with_capacity(entities: usize) -> Self {
        Self {
            entries: Vec::with_capacity(entities + 1),
            ..Self::default()
        }
    }

    /// Returns the type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the index of `T`, registering it (and creating its pool) if
    /// needed.
    pub fn register<T: Component>(&mut self) -> ComponentIndex {
        let index = self.registry.register::<T>();
        if index.as_usize() == self.pools.len() {
            self.pools.push(Box::new(Pool::<T>::new()));
        }
        index
    }

    /// Attach `value` to `entity`, returning the value it replaced.
    ///
    /// A `None` return means the component was newly attached, which is a
    /// structural change.
    pub fn insert<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> (ComponentIndex, Option<T>) {
        let index = self.register::<T>();
        self.entry_mut(entity).mask.set(index);
        let previous = self.pool_mut::<T>(index).insert(entity.id(), value);
        (index, previous)
    }

    /// Detach `T` from `entity`, returning the removed value.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<(ComponentIndex, T)> {
        let index = self.registry.index_of::<T>()?;
        if !self.has_component(entity, index) {
            return None;
        }
        self.entries[entity.id() as usize].mask.clear(index);
        let value = self.pool_mut::<T>(index).take(entity.id())?;
        Some((index, value))
    }

    /// Detach every component from `entity`, returning the indices removed in
    /// ascending order.
    pub fn remove_all(&mut self, entity: Entity) -> Vec<ComponentIndex> {
        let Some(entry) = self.entries.get_mut(entity.id() as usize) else {
            return Vec::new();
        };
        if entry.version != entity.version() {
            return Vec::new();
        }
        let removed: Vec<ComponentIndex> = entry.mask.iter().collect();
        entry.mask.reset();
        for index in &removed {
            self.pools[index.as_usize()].remove_slot(entity.id());
        }
        removed
    }

    /// Returns a reference to `entity`'s `T`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let index = self.registry.index_of::<T>()?;
        if !self.has_component(entity, index) {
            return None;
        }
        self.pools[index.as_usize()]
            .as_any()
            .downcast_ref::<Pool<T>>()?
            .values
            .get(entity.id() as usize)?
            .as_ref()
    }

    /// Returns a mutable reference to `entity`'s `T`.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let index = self.registry.index_of::<T>()?;
        if !self.has_component(entity, index) {
            return None;
        }
        self.pools[index.as_usize()]
            .as_any_mut()
            .downcast_mut::<Pool<T>>()?
            .values
            .get_mut(entity.id() as usize)?
            .as_mut()
    }

    /// Returns `true` if `entity` has a `T`.
    #[must_use]
    pub fn contains<T: Component>(&self, entity: Entity) -> bool {
        self.registry
            .index_of::<T>()
            .is_some_and(|index| self.has_component(entity, index))
    }

    /// Iterate over the component indices `entity` currently has.
    pub fn component_indices(&self, entity: Entity) -> impl Iterator<Item = ComponentIndex> + '_ {
        self.entries
            .get(entity.id() as usize)
            .filter(|entry| entry.version == entity.version())
            .into_iter()
            .flat_map(|entry| entry.mask.iter())
    }

    /// Returns the entry for `entity`, resetting it if the slot still holds a
    /// previous occupant's components.
    fn entry_mut(&mut self, entity: Entity) -> &mut EntityComponents {
        let id = entity.id() as usize;
        if id >= self.entries.len() {
            self.entries.resize_with(id + 1, EntityComponents::default);
        }
        if self.entries[id].version != entity.version() {
            let stale: Vec<ComponentIndex> = self.entries[id].mask.iter().collect();
            for index in stale {
                self.pools[index.as_usize()].remove_slot(entity.id());
            }
            self.entries[id].mask.reset();
            self.entries[id].version = entity.version();
        }
        &mut self.entries[id]
    }

    fn pool_mut<T: Component>(&mut self, index: ComponentIndex) -> &mut Pool<T> {
        self.pools[index.as_usize()]
            .as_any_mut()
            .downcast_mut::<Pool<T>>()
            .expect("pool at a registered index stores that index's type")
    }
}

impl ComponentRegistry for Components {
    fn registered_count(&self) -> usize {
        self.registry.registered_count()
    }
}

impl ComponentStorage for Components {
    fn has_component(&self, entity: Entity, index: ComponentIndex) -> bool {
        self.entries
            .get(entity.id() as usize)
            .is_some_and(|entry| entry.version == entity.version() && entry.mask.contains(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::WorldId;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Name(&'static str);
    impl Component for Name {}

    fn entity(id: u32, version: u32) -> Entity {
        Entity::new(id, version, WorldId::NONE)
    }

    #[test]
    fn test_insert_and_get() {
        let mut components = Components::new();
        let e = entity(1, 0);
        let (index, previous) = components.insert(e, Health(10));
        assert!(previous.is_none());
        assert!(components.has_component(e, index));
        assert_eq!(components.get::<Health>(e), Some(&Health(10)));
        assert!(!components.contains::<Name>(e));
    }

    #[test]
    fn test_insert_replaces() {
        let mut components = Components::new();
        let e = entity(1, 0);
        components.insert(e, Health(10));
        let (_, previous) = components.insert(e, Health(20));
        assert_eq!(previous, Some(Health(10)));
        assert_eq!(components.get::<Health>(e), Some(&Health(20)));
    }

    #[test]
    fn test_get_mut() {
        let mut components = Components::new();
        let e = entity(2, 0);
        components.insert(e, Health(1));
        if let Some(h) = components.get_mut::<Health>(e) {
            h.0 = 5;
        }
        assert_eq!(components.get::<Health>(e), Some(&Health(5)));
    }

    #[test]
    fn test_remove() {
        let mut components = Components::new();
        let e = entity(1, 0);
        components.insert(e, Health(3));
        let (index, value) = components.remove::<Health>(e).unwrap();
        assert_eq!(value, Health(3));
        assert!(!components.has_component(e, index));
        assert!(components.remove::<Health>(e).is_none());
        assert!(components.remove::<Name>(e).is_none());
    }

    #[test]
    fn test_remove_all() {
        let mut components = Components::new();
        let e = entity(4, 0);
        let (health, _) = components.insert(e, Health(3));
        let (name, _) = components.insert(e, Name("orc"));
        assert_eq!(components.remove_all(e), vec![health, name]);
        assert_eq!(components.component_indices(e).count(), 0);
        assert!(components.get::<Name>(e).is_none());
    }

    #[test]
    fn test_stale_version_sees_nothing() {
        let mut components = Components::new();
        let old = entity(1, 0);
        let (index, _) = components.insert(old, Health(3));

        let new = entity(1, 1);
        assert!(!components.has_component(new, index));
        components.insert(new, Name("new"));
        assert!(!components.has_component(old, index));
        assert!(components.get::<Health>(new).is_none());
        assert!(components.remove_all(old).is_empty());
    }

    #[test]
    fn test_registered_count_grows() {
        let mut components = Components::new();
        assert_eq!(components.registered_count(), 0);
        components.register::<Health>();
        components.register::<Health>();
        components.register::<Name>();
        assert_eq!(components.registered_count(), 2);
    }
}
