//! Core [`Component`] trait and component type registration.
//!
//! Every Rust type stored in the ECS gets a dense [`ComponentIndex`] the first
//! time it is seen. The index is what the query cache and filters work with;
//! they never look at the type itself.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

/// A small, dense identifier for a component type.
///
/// Indices are handed out in registration order starting at 0 and are used
/// directly as array positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentIndex(pub u32);

impl ComponentIndex {
    /// Returns the index as a `usize` for slicing.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ComponentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The core component trait.
///
/// Components must be `Send + Sync` so an [`Ecs`](crate::Ecs) can be moved to
/// another thread.
///
/// # Examples
///
/// ```rust
/// use simple_ecs::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Reports how many component types have been registered.
///
/// The count only ever grows. The query cache uses it as the lower bound when
/// sizing its per-component reverse index.
pub trait ComponentRegistry {
    /// Number of registered component types.
    fn registered_count(&self) -> usize;
}

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentMeta {
    /// The index assigned at registration.
    pub index: ComponentIndex,
    /// The human-readable name of the component.
    pub name: &'static str,
}

/// Assigns each Rust component type a stable [`ComponentIndex`].
#[derive(Debug, Default)]
pub struct TypeRegistry {
    indices: HashMap<TypeId, ComponentIndex>,
    metas: Vec<ComponentMeta>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `T`, registering it if this is the first time.
    pub fn register<T: Component>(&mut self) -> ComponentIndex {
        if let Some(&index) = self.indices.get(&TypeId::of::<T>()) {
            return index;
        }
        let index = ComponentIndex(self.metas.len() as u32);
        self.indices.insert(TypeId::of::<T>(), index);
        self.metas.push(ComponentMeta {
            index,
            name: T::type_name(),
        });
        debug!(component = T::type_name(), %index, "registered component type");
        index
    }

    /// Returns the index of `T` if it has been registered.
    #[must_use]
    pub fn index_of<T: Component>(&self) -> Option<ComponentIndex> {
        self.indices.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the metadata for a registered index.
    #[must_use]
    pub fn meta(&self, index: ComponentIndex) -> Option<&ComponentMeta> {
        self.metas.get(index.as_usize())
    }

    /// Returns the name of a registered index.
    #[must_use]
    pub fn name(&self, index: ComponentIndex) -> Option<&'static str> {
        self.meta(index).map(|meta| meta.name)
    }
}

impl ComponentRegistry for TypeRegistry {
    fn registered_count(&self) -> usize {
        self.metas.len()
    }
}
