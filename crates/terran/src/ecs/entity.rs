//! # Entity — Lightweight Identifiers for Game Objects
//!
//! An [`Entity`] is just a number — it doesn't "contain" anything. The
//! [`World`](super::world::World) maps entities to their components through
//! the per-kind component stores.
//!
//! ## Generational Indices
//!
//! Entity slots are recycled after destruction. To keep an old handle from
//! silently pointing at whatever moved into its slot, each handle pairs the
//! slot index with a **generation**. Destroying an entity bumps the slot's
//! generation, so the old handle no longer matches and lookups fail safely.
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← original
//! Entity { index: 5, generation: 1 }  ← after destroy + recycle
//! ```
//!
//! ## Bit Packing
//!
//! Handles are a single `u32`:
//!
//! ```text
//! [ generation (12 bits) ][ index (20 bits) ]
//! [31                  20][19              0]
//! ```
//!
//! That gives 1,048,575 usable slots. The raw value `0` is [`Entity::NULL`]:
//! slot 0 is reserved when the allocator is built and never handed out, so no
//! live handle can ever compare equal to `NULL`.
//!
//! ## Free List
//!
//! Freed slots form a singly-linked list threaded through the slot storage
//! itself (no side `Vec`). Creation pops the head, destruction pushes onto it,
//! so the most recently freed slot is reused first.

use std::fmt;

/// Number of low bits holding the slot index.
const INDEX_BITS: u32 = 20;
/// Mask for the index portion of a packed handle.
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
/// Mask for the generation once shifted down (12 bits).
const GENERATION_MASK: u32 = (1 << (32 - INDEX_BITS)) - 1;
/// Free-list terminator.
const NO_SLOT: u32 = u32::MAX;

/// A lightweight handle to an entity in the [`World`](super::world::World).
///
/// Entities are created via [`World::create_entity`](super::World::create_entity)
/// and destroyed via [`World::destroy_entity`](super::World::destroy_entity).
/// A handle is only meaningful for the world that created it, and only while
/// its generation matches the slot's.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Entity(u32);

impl Entity {
    /// The reserved null handle (index 0, generation 0). Never alive.
    pub const NULL: Self = Self(0);

    /// Largest index a handle can carry.
    pub const MAX_INDEX: u32 = INDEX_MASK;

    /// Largest generation before wraparound.
    pub const MAX_GENERATION: u32 = GENERATION_MASK;

    /// Pack an index and generation into a handle. Out-of-range bits are
    /// masked off.
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self(((generation & GENERATION_MASK) << INDEX_BITS) | (index & INDEX_MASK))
    }

    /// Rebuild a handle from [`to_bits`](Self::to_bits).
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The packed representation.
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Returns the slot index.
    pub const fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    /// Returns the generation.
    pub const fn generation(self) -> u32 {
        self.0 >> INDEX_BITS
    }

    /// `true` for [`Entity::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// One identity slot per index ever allocated.
#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    /// Next free slot when this one is free, `NO_SLOT` otherwise.
    next_free: u32,
    alive: bool,
}

impl Slot {
    const RESERVED: Self = Self {
        generation: 0,
        next_free: NO_SLOT,
        alive: false,
    };
}

/// Manages entity handle allocation and recycling.
///
/// ## Memory Layout
///
/// ```text
/// slots:     [rsv, 1v0*, 2v1, 3v0*, 4v2]   (* = alive)
/// free_head: 4 → 2 → end                     threaded through `next_free`
/// ```
pub struct EntityAllocator {
    slots: Vec<Slot>,
    free_head: u32,
    free_count: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-reserve room for `capacity` entities. Anything past
    /// [`Entity::MAX_INDEX`] could never be used and is ignored.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(Entity::MAX_INDEX as usize);
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.push(Slot::RESERVED);
        Self {
            slots,
            free_head: NO_SLOT,
            free_count: 0,
        }
    }

    /// Allocate a new [`Entity`]. Reuses the most recently freed slot if one
    /// is available, otherwise appends a fresh slot with generation 0.
    ///
    /// # Panics
    ///
    /// Panics if all [`Entity::MAX_INDEX`] slots are live.
    pub fn create(&mut self) -> Entity {
        if self.free_head != NO_SLOT {
            let index = self.free_head;
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.next_free;
            slot.next_free = NO_SLOT;
            slot.alive = true;
            self.free_count -= 1;
            // Generation was already bumped when the slot was freed.
            return Entity::from_parts(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        if index > Entity::MAX_INDEX {
            panic!(
                "Entity index space exhausted: {} live entities",
                Entity::MAX_INDEX
            );
        }
        self.slots.push(Slot {
            generation: 0,
            next_free: NO_SLOT,
            alive: true,
        });
        Entity::from_parts(index, 0)
    }

    /// Free an entity's slot for reuse.
    ///
    /// Returns `true` if the handle was alive, `false` if it was stale, dead,
    /// out of range or null (in which case nothing changes).
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let index = entity.index();
        let slot = &mut self.slots[index as usize];
        slot.alive = false;
        // Bump generation so any existing handles become stale.
        slot.generation = (slot.generation + 1) & GENERATION_MASK;
        slot.next_free = self.free_head;
        self.free_head = index;
        self.free_count += 1;
        true
    }

    /// Check if an entity handle is still valid (not destroyed or stale).
    pub fn is_alive(&self, entity: Entity) -> bool {
        // Slot 0 is reserved and never alive, which covers `Entity::NULL`.
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Returns the number of currently alive entities.
    pub fn alive_count(&self) -> usize {
        self.slots.len() - 1 - self.free_count
    }

    /// Returns the number of free (recyclable) slots.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Returns the number of slots ever allocated, excluding the reserved one.
    pub fn total_slots(&self) -> u32 {
        (self.slots.len() - 1) as u32
    }

    /// Iterate over all live handles in index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Entity::from_parts(index as u32, slot.generation))
    }

    /// Forget every slot. Allocation restarts from index 1, generation 0, so
    /// handles issued before the clear must not be kept: the same values will
    /// be handed out again.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.free_head = NO_SLOT;
        self.free_count = 0;
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
