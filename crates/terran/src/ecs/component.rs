//! # Component — Sparse-Set Storage Per Kind
//!
//! In an ECS, components are plain data — a `Position`, a `Velocity`, a
//! `Health`. Each component kind gets its own [`ComponentStore`], a sparse set
//! that keeps the values packed in one contiguous `Vec<T>`.
//!
//! ## Memory Layout
//!
//! ```text
//! sparse: [ -, 2, -, 0, 1 ]        ← indexed by Entity::index(), "-" = ABSENT
//! dense:  [ c3, c4, c1 ]           ← the component values, no holes
//! owners: [ 3v0, 4v1, 1v0 ]        ← parallel to dense: who owns slot i
//! ```
//!
//! Lookup is one hop: `dense[sparse[entity.index()]]`. Iteration is a linear
//! scan of `dense` and `owners`, with no indirection at all.
//!
//! ## Swap-and-Pop
//!
//! Removing from the middle of `dense` would leave a hole. Instead the last
//! element is moved into the vacated slot and its owner's sparse entry is
//! repointed. Storage stays contiguous, but dense order is **not** preserved
//! across removals.
//!
//! ## Handle Equality
//!
//! [`ComponentStore::contains`] checks the full handle (index *and*
//! generation) against `owners`, not just the sparse entry. A stale handle
//! whose index now belongs to a different entity can never reach that
//! entity's data.

use std::any::Any;

use super::entity::Entity;

/// Marker trait for component types. Blanket-implemented for every `'static`
/// type, so any plain struct can be attached to an entity.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Sparse entry meaning "this index has no component here".
const ABSENT: u32 = u32::MAX;

/// Packed storage for every component of kind `T`.
pub struct ComponentStore<T: Component> {
    dense: Vec<T>,
    owners: Vec<Entity>,
    sparse: Vec<u32>,
}

impl<T: Component> ComponentStore<T> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            owners: Vec::new(),
            sparse: Vec::new(),
        }
    }

    /// Dense slot currently recorded for this entity's index, regardless of
    /// which generation owns it.
    fn slot_of(&self, index: u32) -> Option<usize> {
        match self.sparse.get(index as usize) {
            Some(&slot) if slot != ABSENT => Some(slot as usize),
            _ => None,
        }
    }

    /// Dense slot holding `entity`'s component, if the full handle matches.
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        self.slot_of(entity.index())
            .filter(|&slot| self.owners[slot] == entity)
    }

    /// Insert a component, or overwrite the existing one in place.
    ///
    /// Replacing never moves the value: the dense slot stays the same. If the
    /// index is occupied by an older generation of the same slot, that stale
    /// record is taken over by `entity`.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        let index = entity.index() as usize;
        if let Some(slot) = self.slot_of(entity.index()) {
            self.owners[slot] = entity;
            self.dense[slot] = value;
            return &mut self.dense[slot];
        }

        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, ABSENT);
        }
        let slot = self.dense.len();
        self.sparse[index] = slot as u32;
        self.dense.push(value);
        self.owners.push(entity);
        &mut self.dense[slot]
    }

    /// `true` if this exact handle owns a component here.
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Get a shared reference to `entity`'s component.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let slot = self.dense_index(entity)?;
        Some(&self.dense[slot])
    }

    /// Get a mutable reference to `entity`'s component.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = self.dense_index(entity)?;
        Some(&mut self.dense[slot])
    }

    /// Swap-remove `entity`'s component and return it. Returns `None` (and
    /// changes nothing) if the entity doesn't hold one.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.dense_index(entity)?;
        let last = self.dense.len() - 1;

        let value = self.dense.swap_remove(slot);
        self.owners.swap_remove(slot);

        // The former last element now lives at `slot`; repoint its owner.
        if slot != last {
            let moved = self.owners[slot];
            self.sparse[moved.index() as usize] = slot as u32;
        }
        self.sparse[entity.index() as usize] = ABSENT;
        Some(value)
    }

    /// Call `f(owner, &mut value)` for every component, in dense order.
    pub fn for_each(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        for (&owner, value) in self.owners.iter().zip(self.dense.iter_mut()) {
            f(owner, value);
        }
    }

    /// Iterate `(owner, &value)` in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterate `(owner, &mut value)` in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }

    /// Owners, parallel to [`as_slice`](Self::as_slice).
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// The packed component values.
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// The packed component values, mutably. Membership can't change through
    /// a slice, so this is safe to hand out.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Drop every component. The sparse array keeps its allocation.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.owners.clear();
        self.sparse.fill(ABSENT);
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind-erased face of a [`ComponentStore`], used by the
/// [`ComponentRegistry`](super::registry::ComponentRegistry) to purge a
/// destroyed entity from every store without knowing the concrete types.
pub(crate) trait ErasedStore {
    /// Remove `entity`'s component if present. No-op otherwise.
    fn remove_entity(&mut self, entity: Entity);
    fn len(&self) -> usize;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
