//! Filter registry and incremental membership maintenance.
//!
//! The [`QueryCache`] owns every [`Filter`] ever requested. Requests for the
//! same include/exclude sets resolve to the same [`FilterId`], so systems that
//! share a predicate share one result set.
//!
//! A reverse index maps each component index to the filters that mention it,
//! as included **or** excluded. Removing a component can make an entity newly
//! satisfy an exclusion, and adding one can make it newly violate one, so both
//! kinds of reference have to trigger re-evaluation.

use std::collections::HashMap;

use tracing::debug;

use crate::component::ComponentIndex;
use crate::entity::Entity;
use crate::filter::{Filter, FilterId, normalize};
use crate::storage::ComponentStorage;
use crate::world::EntityWorld;

/// Normalized `(included, excluded)` pair identifying a filter.
type FilterKey = (Vec<ComponentIndex>, Vec<ComponentIndex>);

/// Owns the cached filters and keeps them consistent with component changes.
#[derive(Debug, Default)]
pub struct QueryCache {
    filters: Vec<Filter>,
    by_key: HashMap<FilterKey, FilterId>,
    /// Indexed by component index. Grows lazily, never shrinks.
    by_component: Vec<Vec<FilterId>>,
}

impl QueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with reverse-index room for `components` types.
    #[must_use]
    pub fn with_capacity(components: usize) -> Self {
        Self {
            by_component: Vec::with_capacity(components),
            ..Self::default()
        }
    }

    /// Returns the filter for `(included, excluded)`, creating it if needed.
    ///
    /// Input order and duplicates do not matter. A new filter is registered
    /// under every index it mentions and seeded by testing each live entity
    /// of `world` once.
    pub fn get_or_create_filter<S: ComponentStorage + ?Sized>(
        &mut self,
        included: &[ComponentIndex],
        excluded: &[ComponentIndex],
        world: &EntityWorld,
        storage: &S,
    ) -> FilterId {
        let key = (normalize(included), normalize(excluded));
        if let Some(&id) = self.by_key.get(&key) {
            debug_assert!(self.filters[id.0].matches(included, excluded));
            return id;
        }

        let id = FilterId(self.filters.len());
        let mut filter = Filter::new(&key.0, &key.1);

        let highest = key.0.iter().chain(&key.1).map(|i| i.as_usize() + 1).max();
        self.grow(highest.unwrap_or(0).max(storage.registered_count()));
        for index in key.0.iter().chain(&key.1) {
            self.by_component[index.as_usize()].push(id);
        }

        for entity in world.entities() {
            filter.handle_entity(entity, storage);
        }

        debug!(
            filter = id.0,
            included = ?key.0,
            excluded = ?key.1,
            seeded = filter.len(),
            "created filter"
        );

        self.filters.push(filter);
        self.by_key.insert(key, id);
        id
    }

    /// Re-evaluate `entity` against every filter that mentions `index`.
    ///
    /// Must be called once per structural change (attach or detach), in the
    /// order the changes happen.
    pub fn on_component_changed<S: ComponentStorage + ?Sized>(
        &mut self,
        entity: Entity,
        index: ComponentIndex,
        storage: &S,
    ) {
        self.grow((index.as_usize() + 1).max(storage.registered_count()));
        for &id in &self.by_component[index.as_usize()] {
            self.filters[id.0].handle_entity(entity, storage);
        }
    }

    /// Evaluate a freshly created entity against the filters that can match
    /// it without any component change, i.e. those with nothing included.
    pub fn on_entity_created<S: ComponentStorage + ?Sized>(&mut self, entity: Entity, storage: &S) {
        for filter in &mut self.filters {
            if filter.included().is_empty() {
                filter.handle_entity(entity, storage);
            }
        }
    }

    /// Remove `entity` from every filter, regardless of which components it
    /// had.
    pub fn on_entity_destroyed(&mut self, entity: Entity) {
        for filter in &mut self.filters {
            filter.remove_entity(entity);
        }
    }

    /// Returns the filter behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different cache.
    #[must_use]
    pub fn filter(&self, id: FilterId) -> &Filter {
        &self.filters[id.0]
    }

    /// Returns the filter behind `id`, or `None` if it is out of range.
    #[must_use]
    pub fn get(&self, id: FilterId) -> Option<&Filter> {
        self.filters.get(id.0)
    }

    /// Iterate over every cached filter with its id.
    pub fn filters(&self) -> impl Iterator<Item = (FilterId, &Filter)> {
        self.filters.iter().enumerate().map(|(i, f)| (FilterId(i), f))
    }

    /// Returns the filters registered under `index`.
    #[must_use]
    pub fn filters_for(&self, index: ComponentIndex) -> &[FilterId] {
        self.by_component
            .get(index.as_usize())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of component slots in the reverse index.
    #[must_use]
    pub fn indexed_components(&self) -> usize {
        self.by_component.len()
    }

    /// Number of cached filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filter has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn grow(&mut self, len: usize) {
        if self.by_component.len() < len {
            self.by_component.resize_with(len, Vec::new);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::filter::tests::{FakeStorage, idx};

    #[test]
    fn test_dedup_returns_same_filter() {
        let world = EntityWorld::new();
        let storage = FakeStorage::default();
        let mut cache = QueryCache::new();

        let a = cache.get_or_create_filter(&idx(&[1, 3]), &idx(&[2]), &world, &storage);
        let b = cache.get_or_create_filter(&idx(&[1, 3]), &idx(&[2]), &world, &storage);
        let c = cache.get_or_create_filter(&idx(&[3, 1]), &idx(&[2]), &world, &storage);
        let d = cache.get_or_create_filter(&idx(&[3, 1, 3]), &idx(&[2, 2]), &world, &storage);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
        assert_eq!(cache.len(), 1);

        let other = cache.get_or_create_filter(&idx(&[1, 3]), &[], &world, &storage);
        assert_ne!(a, other);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_unknown_id() {
        let world = EntityWorld::new();
        let storage = FakeStorage::default();
        let mut cache = QueryCache::new();
        assert!(cache.get(FilterId(0)).is_none());

        let id = cache.get_or_create_filter(&idx(&[1]), &[], &world, &storage);
        assert_eq!(cache.get(id).map(Filter::included), Some(&idx(&[1])[..]));
        assert!(cache.get(FilterId(1)).is_none());
    }

    #[test]
    fn test_registered_under_included_and_excluded() {
        let world = EntityWorld::new();
        let storage = FakeStorage::default();
        let mut cache = QueryCache::new();
        let id = cache.get_or_create_filter(&idx(&[1, 3]), &idx(&[2]), &world, &storage);

        for i in [1, 2, 3] {
            assert_eq!(cache.filters_for(ComponentIndex(i)), &[id]);
        }
        assert!(cache.filters_for(ComponentIndex(0)).is_empty());
        assert!(cache.filters_for(ComponentIndex(40)).is_empty());
        assert_eq!(cache.indexed_components(), 4);
    }

    #[test]
    fn test_reverse_index_bounded_below_by_registry() {
        let world = EntityWorld::new();
        let mut storage = FakeStorage::default();
        storage.count = 10;
        let mut cache = QueryCache::new();
        cache.get_or_create_filter(&idx(&[1]), &[], &world, &storage);
        assert_eq!(cache.indexed_components(), 10);

        let mut world = EntityWorld::new();
        let e = world.create_entity();
        cache.on_component_changed(e, ComponentIndex(25), &storage);
        assert_eq!(cache.indexed_components(), 26);

        storage.count = 5;
        cache.on_component_changed(e, ComponentIndex(0), &storage);
        assert_eq!(cache.indexed_components(), 26);
    }

    #[test]
    fn test_incremental_include_exclude() {
        let mut world = EntityWorld::new();
        let mut storage = FakeStorage::default();
        let mut cache = QueryCache::new();
        let e = world.create_entity();

        storage.add(e, 2);
        cache.on_component_changed(e, ComponentIndex(2), &storage);

        let id = cache.get_or_create_filter(&idx(&[1, 3]), &idx(&[2]), &world, &storage);
        assert!(!cache.filter(id).contains(e));

        storage.add(e, 1);
        cache.on_component_changed(e, ComponentIndex(1), &storage);
        assert!(!cache.filter(id).contains(e));

        storage.add(e, 3);
        cache.on_component_changed(e, ComponentIndex(3), &storage);
        assert!(!cache.filter(id).contains(e));

        storage.remove(e, 2);
        cache.on_component_changed(e, ComponentIndex(2), &storage);
        assert!(cache.filter(id).contains(e));

        storage.add(e, 2);
        cache.on_component_changed(e, ComponentIndex(2), &storage);
        assert!(!cache.filter(id).contains(e));
    }

    #[test]
    fn test_unrelated_change_does_not_touch_filter() {
        let mut world = EntityWorld::new();
        let mut storage = FakeStorage::default();
        let mut cache = QueryCache::new();
        let e = world.create_entity();
        let id = cache.get_or_create_filter(&idx(&[1]), &[], &world, &storage);

        // Attached without notifying index 1: the filter must not notice it
        // through a change on index 7.
        storage.add(e, 1);
        storage.add(e, 7);
        cache.on_component_changed(e, ComponentIndex(7), &storage);
        assert!(!cache.filter(id).contains(e));
    }

    #[test]
    fn test_destruction_sweeps_every_filter() {
        let mut world = EntityWorld::new();
        let mut storage = FakeStorage::default();
        let mut cache = QueryCache::new();
        let e = world.create_entity();
        for i in 0..4 {
            storage.add(e, i);
        }

        let mut ids: Vec<FilterId> = Vec::new();
        for i in 0..4 {
            ids.push(cache.get_or_create_filter(&idx(&[i]), &[], &world, &storage));
        }
        ids.push(cache.get_or_create_filter(&[], &idx(&[9]), &world, &storage));
        assert!(ids.iter().all(|&id| cache.filter(id).contains(e)));

        // No removal notifications before destruction.
        cache.on_entity_destroyed(e);
        world.on_entity_destroyed(e);
        assert!(ids.iter().all(|&id| !cache.filter(id).contains(e)));
    }

    #[test]
    fn test_created_entity_joins_exclusion_only_filters() {
        let mut world = EntityWorld::new();
        let storage = FakeStorage::default();
        let mut cache = QueryCache::new();
        let not_two = cache.get_or_create_filter(&[], &idx(&[2]), &world, &storage);
        let has_one = cache.get_or_create_filter(&idx(&[1]), &[], &world, &storage);

        let e = world.create_entity();
        cache.on_entity_created(e, &storage);
        assert!(cache.filter(not_two).contains(e));
        assert!(!cache.filter(has_one).contains(e));
    }

    #[test]
    fn test_bootstrap_matches_brute_force() {
        let mut world = EntityWorld::new();
        let mut storage = FakeStorage::default();
        let mut cache = QueryCache::new();

        let entities: Vec<Entity> = (0..100).map(|_| world.create_entity()).collect();
        for (n, &e) in entities.iter().enumerate() {
            for bit in 0..4u32 {
                if (n >> bit) & 1 == 1 || n % (bit as usize + 2) == 0 {
                    storage.add(e, bit);
                }
            }
        }
        // A destroyed entity must not be seeded even if storage still knows it.
        world.on_entity_destroyed(entities[0]);

        let id = cache.get_or_create_filter(&idx(&[0, 2]), &idx(&[3]), &world, &storage);
        let filter = cache.filter(id);
        for &e in &entities[1..] {
            assert_eq!(filter.contains(e), filter.test(e, &storage), "{e}");
        }
        assert!(!filter.contains(entities[0]));
        assert!(!filter.is_empty());
    }

    proptest! {
        #[test]
        fn prop_incremental_equals_brute_force(
            ops in proptest::collection::vec((0usize..8, 0u32..5, any::<bool>()), 1..300)
        ) {
            let mut world = EntityWorld::new();
            let mut storage = FakeStorage::default();
            let mut cache = QueryCache::new();
            let entities: Vec<Entity> = (0..8).map(|_| world.create_entity()).collect();

            let early = cache.get_or_create_filter(&idx(&[0, 1]), &idx(&[2]), &world, &storage);
            for (step, (slot, index, attach)) in ops.into_iter().enumerate() {
                let e = entities[slot];
                if attach {
                    storage.add(e, index);
                } else {
                    storage.remove(e, index);
                }
                cache.on_component_changed(e, ComponentIndex(index), &storage);

                if step == 50 {
                    cache.get_or_create_filter(&idx(&[3]), &idx(&[4, 0]), &world, &storage);
                }
            }
            let late = cache.get_or_create_filter(&idx(&[3]), &idx(&[4, 0]), &world, &storage);

            for id in [early, late] {
                let filter = cache.filter(id);
                for &e in &entities {
                    prop_assert_eq!(filter.contains(e), filter.test(e, &storage));
                }
            }
        }
    }
}
