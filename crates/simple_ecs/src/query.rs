//! Declarative filter construction.
//!
//! A [`FilterBuilder`] collects the component types a query requires and the
//! ones it rejects, then resolves them to a cached [`FilterId`]:
//!
//! ```rust
//! use simple_ecs::{Component, Ecs};
//!
//! struct Position;
//! impl Component for Position {}
//! struct Frozen;
//! impl Component for Frozen {}
//!
//! let mut ecs = Ecs::new();
//! let movable = ecs.filter().include::<Position>().exclude::<Frozen>().build();
//! assert_eq!(ecs.query(movable).count(), 0);
//! ```

use crate::component::{Component, ComponentIndex};
use crate::filter::FilterId;
use crate::manager::Ecs;

/// A single term of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFilter {
    /// Only match entities that have this component.
    With(ComponentIndex),
    /// Only match entities that do NOT have this component.
    Without(ComponentIndex),
}

/// Collects included and excluded component types for
/// [`QueryCache::get_or_create_filter`](crate::QueryCache::get_or_create_filter).
#[derive(Debug)]
#[must_use = "a filter builder does nothing until `build` is called"]
pub struct FilterBuilder<'a> {
    ecs: &'a mut Ecs,
    included: Vec<ComponentIndex>,
    excluded: Vec<ComponentIndex>,
}

impl<'a> FilterBuilder<'a> {
    pub(crate) fn new(ecs: &'a mut Ecs) -> Self {
        Self {
            ecs,
            included: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Require component `T`. Registers `T` if it has not been seen yet.
    pub fn include<T: Component>(mut self) -> Self {
        let index = self.ecs.register::<T>();
        self.included.push(index);
        self
    }

    /// Reject entities that have component `T`. Registers `T` if it has not
    /// been seen yet.
    pub fn exclude<T: Component>(mut self) -> Self {
        let index = self.ecs.register::<T>();
        self.excluded.push(index);
        self
    }

    /// Require a component by raw index.
    pub fn include_index(mut self, index: ComponentIndex) -> Self {
        self.included.push(index);
        self
    }

    /// Reject a component by raw index.
    pub fn exclude_index(mut self, index: ComponentIndex) -> Self {
        self.excluded.push(index);
        self
    }

    /// Add a single filter term.
    pub fn with(self, term: QueryFilter) -> Self {
        match term {
            QueryFilter::With(index) => self.include_index(index),
            QueryFilter::Without(index) => self.exclude_index(index),
        }
    }

    /// Resolve the collected sets to a cached filter, creating and seeding it
    /// on first use.
    pub fn build(self) -> FilterId {
        if let Some(index) = self.included.iter().find(|&&i| self.excluded.contains(&i)) {
            tracing::warn!(
                %index,
                "component is both included and excluded; filter can never match"
            );
        }
        self.ecs.get_or_create_filter(&self.included, &self.excluded)
    }
}
