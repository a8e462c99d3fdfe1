//! # Registry — One Store Per Component Kind
//!
//! The [`ComponentRegistry`] owns every [`ComponentStore`], looked up by
//! component type at run time.
//!
//! ## Kind Tags
//!
//! The first time a type is used it is issued a small-integer
//! [`ComponentKind`]. The tag indexes straight into a `Vec` of boxed stores,
//! so after the one `TypeId` hash the rest is plain indexing:
//!
//! ```text
//! kinds:  { TypeId(Position) → 0, TypeId(Velocity) → 1 }
//! stores: [ Box<ComponentStore<Position>>, Box<ComponentStore<Velocity>> ]
//! ```
//!
//! Stores are boxed behind the kind-erased `ErasedStore` trait. That gives the
//! world a uniform "remove this entity from everything" path for destruction,
//! while the generic accessors downcast back to the concrete store.
//!
//! ## Taking Stores Out
//!
//! Queries need `&mut` access to several stores at once. Rather than juggling
//! disjoint borrows, a query [`take`](ComponentRegistry::take)s each store out
//! of its slot, iterates, and [`restore`](ComponentRegistry::restore)s it.
//! While taken, the slot is empty and the kind looks store-less.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{Component, ComponentStore, ErasedStore};
use super::entity::Entity;

/// Run-time tag for a registered component kind. Tags are issued in
/// registration order starting from 0 and are only meaningful for the
/// registry that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentKind(u32);

impl ComponentKind {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns one [`ComponentStore`] per component kind.
#[derive(Default)]
pub struct ComponentRegistry {
    kinds: HashMap<TypeId, ComponentKind>,
    /// Indexed by `ComponentKind`. `None` only while a query has the store out.
    stores: Vec<Option<Box<dyn ErasedStore>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag issued to `T`, if `T` has been registered.
    pub fn kind_of<T: Component>(&self) -> Option<ComponentKind> {
        self.kinds.get(&TypeId::of::<T>()).copied()
    }

    /// Register `T` (if needed) and return its tag.
    pub fn register<T: Component>(&mut self) -> ComponentKind {
        if let Some(kind) = self.kind_of::<T>() {
            return kind;
        }
        let kind = ComponentKind(self.stores.len() as u32);
        self.kinds.insert(TypeId::of::<T>(), kind);
        self.stores.push(Some(Box::new(ComponentStore::<T>::new())));
        log::debug!(
            "Registered component `{}` as kind {}",
            std::any::type_name::<T>(),
            kind.0
        );
        kind
    }

    /// Get the store for `T`, creating it on first use. Every call for the
    /// same `T` returns the same store.
    ///
    /// # Panics
    ///
    /// Panics if the store is currently taken out by a running query.
    pub fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let kind = self.register::<T>();
        self.stores[kind.index()]
            .as_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStore<T>>())
            .unwrap_or_else(|| {
                panic!(
                    "Store for `{}` is in use by a running query",
                    std::any::type_name::<T>()
                )
            })
    }

    /// Get the store for `T` without creating it.
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        let kind = self.kind_of::<T>()?;
        self.stores[kind.index()]
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
    }

    /// Get the store for `T` mutably without creating it.
    pub fn existing_store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        let kind = self.kind_of::<T>()?;
        self.stores[kind.index()]
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
    }

    /// Remove `entity` from every registered store. Stores that never held it
    /// are untouched.
    pub fn remove_entity(&mut self, entity: Entity) {
        for store in self.stores.iter_mut().flatten() {
            store.remove_entity(entity);
        }
    }

    /// Take `T`'s store out of the registry. Returns `None` if `T` was never
    /// registered or the store is already out.
    pub(crate) fn take<T: Component>(&mut self) -> Option<Box<ComponentStore<T>>> {
        let kind = self.kind_of::<T>()?;
        let erased = self.stores[kind.index()].take()?;
        // The slot for `kind` only ever holds `ComponentStore<T>`.
        erased.into_any().downcast::<ComponentStore<T>>().ok()
    }

    /// Put a store back after [`take`](Self::take).
    pub(crate) fn restore<T: Component>(&mut self, store: Box<ComponentStore<T>>) {
        let kind = self.register::<T>();
        self.stores[kind.index()] = Some(store);
    }

    /// Number of registered component kinds.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// `(type name, component count)` for every store currently present, in
    /// kind order.
    pub fn store_sizes(&self) -> Vec<(&'static str, usize)> {
        self.stores
            .iter()
            .flatten()
            .map(|s| (s.type_name(), s.len()))
            .collect()
    }

    /// Drop every store and forget all kind tags.
    pub fn clear(&mut self) {
        self.stores.clear();
        self.kinds.clear();
        log::debug!("Component registry reset");
    }
}
