//! The owning manager.
//!
//! [`Ecs`] ties the [`EntityWorld`], the [`QueryCache`], and [`Components`]
//! together. It is the only place that mutates component data, so it is also
//! the place that guarantees every structural change reaches the cache, once,
//! in order, and that an entity's component removals are reported before its
//! destruction.

use tracing::debug;

use crate::cache::QueryCache;
use crate::component::{Component, ComponentIndex};
use crate::config::EcsConfig;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::filter::{Filter, FilterId};
use crate::query::FilterBuilder;
use crate::storage::Components;
use crate::world::EntityWorld;

/// An entity world with component storage and cached queries.
#[derive(Debug, Default)]
pub struct Ecs {
    world: EntityWorld,
    cache: QueryCache,
    components: Components,
}

impl Ecs {
    /// Create an empty ECS with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&EcsConfig::default())
    }

    /// Create an empty ECS sized from `config`.
    #[must_use]
    pub fn with_config(config: &EcsConfig) -> Self {
        Self {
            world: EntityWorld::with_capacity(config.initial_entity_capacity),
            cache: QueryCache::with_capacity(config.initial_component_capacity),
            components: Components::with_capacity(config.initial_entity_capacity),
        }
    }

    // -- Entity lifecycle --

    /// Create a new entity with no components.
    ///
    /// The entity immediately joins every filter that has no included
    /// components and so already matches an empty entity.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.world.create_entity();
        self.cache.on_entity_created(entity, &self.components);
        entity
    }

    /// Destroy `entity`, detaching all of its components first.
    ///
    /// Returns `false` if the handle was not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.world.is_alive(entity) {
            return false;
        }
        Self::detach_all(&mut self.components, &mut self.cache, entity);
        self.cache.on_entity_destroyed(entity);
        self.world.on_entity_destroyed(entity)
    }

    /// Destroy every live entity.
    pub fn destroy_all(&mut self) {
        let Self {
            world,
            cache,
            components,
        } = self;
        let count = world.len();
        world.destroy_all(|entity| {
            Self::detach_all(components, cache, entity);
            cache.on_entity_destroyed(entity);
        });
        debug!(count, "destroyed all entities");
    }

    /// Returns `true` if `entity` is alive in this ECS.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.is_alive(entity)
    }

    /// Returns `true` if `entity` has been destroyed, or never belonged here.
    #[must_use]
    pub fn is_destroyed(&self, entity: Entity) -> bool {
        !self.world.is_alive(entity)
    }

    /// Returns the live entity at `id`, or [`Entity::NULL`].
    #[must_use]
    pub fn entity_by_id(&self, id: u32) -> Entity {
        self.world.entity_by_id(id)
    }

    /// Iterate over all live entities.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.world.entities()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.world.len()
    }

    // -- Component operations --

    /// Returns the index of `T`, registering it if needed.
    pub fn register<T: Component>(&mut self) -> ComponentIndex {
        self.components.register::<T>()
    }

    /// Attach `value` to `entity`, returning the value it replaced.
    ///
    /// Replacing an existing value is an update, not a structural change, and
    /// does not re-evaluate filters.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<Option<T>, EcsError> {
        self.ensure_alive(entity)?;
        let (index, previous) = self.components.insert(entity, value);
        if previous.is_none() {
            self.cache
                .on_component_changed(entity, index, &self.components);
        }
        Ok(previous)
    }

    /// Detach `T` from `entity`, returning the removed value if there was one.
    pub fn remove_component<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<Option<T>, EcsError> {
        self.ensure_alive(entity)?;
        let Some((index, value)) = self.components.remove::<T>(entity) else {
            return Ok(None);
        };
        self.cache
            .on_component_changed(entity, index, &self.components);
        Ok(Some(value))
    }

    /// Returns `entity`'s `T`, if it is alive and has one.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.world.is_alive(entity) {
            return None;
        }
        self.components.get::<T>(entity)
    }

    /// Returns `entity`'s `T` mutably, if it is alive and has one.
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.world.is_alive(entity) {
            return None;
        }
        self.components.get_mut::<T>(entity)
    }

    /// Returns `true` if `entity` is alive and has a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.is_alive(entity) && self.components.contains::<T>(entity)
    }

    // -- Queries --

    /// Start building a filter.
    pub fn filter(&mut self) -> FilterBuilder<'_> {
        FilterBuilder::new(self)
    }

    /// Returns the cached filter for the given raw index sets, creating it if
    /// needed.
    pub fn get_or_create_filter(
        &mut self,
        included: &[ComponentIndex],
        excluded: &[ComponentIndex],
    ) -> FilterId {
        self.cache
            .get_or_create_filter(included, excluded, &self.world, &self.components)
    }

    /// Iterate over the entities currently matching `filter`.
    ///
    /// An id beyond this ECS's filters, such as one from another ECS, yields
    /// nothing.
    pub fn query(&self, filter: FilterId) -> impl Iterator<Item = Entity> + '_ {
        self.cache
            .get(filter)
            .into_iter()
            .flat_map(Filter::entities)
    }

    /// Returns the filter behind `id`, or `None` if it is out of range.
    #[must_use]
    pub fn filter_ref(&self, id: FilterId) -> Option<&Filter> {
        self.cache.get(id)
    }

    // -- Accessors --

    /// Returns the entity world.
    #[must_use]
    pub fn world(&self) -> &EntityWorld {
        &self.world
    }

    /// Returns the query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Returns the component storage.
    #[must_use]
    pub fn components(&self) -> &Components {
        &self.components
    }

    fn ensure_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.world.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotAlive(entity))
        }
    }

    /// Detach every component of `entity`, notifying the cache per removal.
    fn detach_all(components: &mut Components, cache: &mut QueryCache, entity: Entity) {
        for index in components.remove_all(entity) {
            cache.on_component_changed(entity, index, &*components);
        }
    }
}
