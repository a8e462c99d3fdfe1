//! # Sparse-Set ECS
//!
//! The entity/component/system core. Each component kind lives in its own
//! sparse set: a packed array of values plus an index from entity to slot, so
//! adding, removing and looking up a component are all O(1) and iterating a
//! kind is a straight walk over contiguous memory.
//!
//! ## Module Overview
//!
//! - [`entity`] — Generational entity handles and their allocator
//! - [`component`] — One sparse-set store per component kind
//! - [`registry`] — Type-erased map from component kind to its store
//! - [`query`] — Closure-based iteration over entities with several kinds
//! - [`system`] — System trait, phases and the schedule runner
//! - [`world`] — Central container (entities + components + systems)
//! - [`hierarchy`] — Children positioned relative to a parent
//! - [`script`] — Per-entity behaviours with fixed-step updates

pub mod component;
pub mod entity;
pub mod hierarchy;
pub mod query;
pub mod registry;
pub mod script;
pub mod system;
pub mod world;

pub use component::{Component, ComponentStore};
pub use entity::{Entity, EntityAllocator};
pub use hierarchy::{HierarchySystem, Relationship};
pub use query::Query;
pub use registry::{ComponentKind, ComponentRegistry};
pub use script::{Behaviour, Script, ScriptSystem};
pub use system::{Schedule, System, SystemPhase};
pub use world::World;
