//! A single cached include/exclude predicate and its match set.

use std::collections::HashSet;

use crate::component::ComponentIndex;
use crate::entity::Entity;
use crate::storage::ComponentStorage;

/// Handle to a [`Filter`] owned by a [`QueryCache`](crate::QueryCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(pub(crate) usize);

impl FilterId {
    /// Returns the position of the filter in its cache.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Sort and deduplicate a list of component indices.
pub(crate) fn normalize(indices: &[ComponentIndex]) -> Vec<ComponentIndex> {
    let mut out = indices.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}

/// A cached query: "has every `included` component and none of the
/// `excluded` ones".
///
/// The match set is maintained incrementally by the owning cache. Iteration
/// order is unspecified and may change after any further mutation.
#[derive(Debug, Clone)]
pub struct Filter {
    included: Vec<ComponentIndex>,
    excluded: Vec<ComponentIndex>,
    entities: HashSet<Entity>,
}

impl Filter {
    /// Create an empty filter. Both lists are normalized.
    #[must_use]
    pub fn new(included: &[ComponentIndex], excluded: &[ComponentIndex]) -> Self {
        Self {
            included: normalize(included),
            excluded: normalize(excluded),
            entities: HashSet::new(),
        }
    }

    /// Sorted, deduplicated included indices.
    #[must_use]
    pub fn included(&self) -> &[ComponentIndex] {
        &self.included
    }

    /// Sorted, deduplicated excluded indices.
    #[must_use]
    pub fn excluded(&self) -> &[ComponentIndex] {
        &self.excluded
    }

    /// Returns `true` if this filter was built from the same sets, ignoring
    /// order and duplicates.
    #[must_use]
    pub fn matches(&self, included: &[ComponentIndex], excluded: &[ComponentIndex]) -> bool {
        self.included == normalize(included) && self.excluded == normalize(excluded)
    }

    /// Evaluate the predicate for `entity` against the current storage.
    #[must_use]
    pub fn test<S: ComponentStorage + ?Sized>(&self, entity: Entity, storage: &S) -> bool {
        self.included.iter().all(|&i| storage.has_component(entity, i))
            && !self.excluded.iter().any(|&i| storage.has_component(entity, i))
    }

    /// Re-evaluate `entity` and add it to or drop it from the match set.
    pub fn handle_entity<S: ComponentStorage + ?Sized>(&mut self, entity: Entity, storage: &S) {
        if self.test(entity, storage) {
            self.entities.insert(entity);
        } else {
            self.entities.remove(&entity);
        }
    }

    /// Drop `entity` from the match set.
    pub fn remove_entity(&mut self, entity: Entity) {
        self.entities.remove(&entity);
    }

    /// Returns `true` if `entity` is currently a match.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Iterate over the current matches.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Number of matching entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if nothing matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
