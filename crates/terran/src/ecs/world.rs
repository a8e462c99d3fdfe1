//! # World — The Central Container
//!
//! The [`World`] owns all entities, their components and the systems that
//! update them. Gameplay code talks to nothing else.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ World                                               │
//! │                                                     │
//! │  entities:   EntityAllocator                        │
//! │    index + generation per slot, LIFO free list      │
//! │                                                     │
//! │  components: ComponentRegistry                      │
//! │    one ComponentStore<T> per kind (sparse set)      │
//! │                                                     │
//! │  schedule:   Schedule                               │
//! │    systems sorted by (phase, priority)              │
//! │                                                     │
//! │  config:     WorldConfig                            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ticking
//!
//! [`tick`](World::tick) runs every system once. Systems get `&mut World`, so
//! the schedule can't stay inside the world while it runs: it is moved out
//! for the duration of the tick and moved back afterwards.
//!
//! ```text
//! tick(dt)
//!   ├─ take schedule out of world (world.schedule is now empty)
//!   ├─ run systems ── a system calls add_system(...) → lands in the
//!   │                 empty world.schedule, i.e. queued
//!   └─ put schedule back, queued systems appended (run from next tick)
//! ```
//!
//! [`reset`](World::reset) from inside a system clears entities and
//! components immediately; the running schedule is dropped once the tick
//! ends instead of being put back.
//!
//! ## Handles
//!
//! Every per-entity operation accepts any handle. A destroyed or stale
//! handle is never an error: lookups return `None`/`false`, removals and
//! destruction do nothing.
//!
//! ## Comparison
//!
//! - **hecs**: World stores only entities/components. No systems.
//! - **bevy_ecs**: World has entities, components, resources, schedules,
//!   observers, hooks... much more.

use super::component::{Component, ComponentStore};
use super::entity::{Entity, EntityAllocator};
use super::query::Query;
use super::registry::ComponentRegistry;
use super::system::{Schedule, System, SystemPhase};
use crate::config::WorldConfig;
use crate::error::TickError;

/// The central container for all game state.
pub struct World {
    entities: EntityAllocator,
    components: ComponentRegistry,
    /// While ticking, this holds only systems queued by running systems.
    schedule: Schedule,
    config: WorldConfig,
    tick_count: u64,
    ticking: bool,
    /// Set by `reset` during a tick: drop the running schedule when it ends.
    reset_requested: bool,
    /// Entities created since the start of the last tick (diagnostics only).
    #[cfg(feature = "diagnostics")]
    created_this_tick: u32,
    /// Entities destroyed since the start of the last tick (diagnostics only).
    #[cfg(feature = "diagnostics")]
    destroyed_this_tick: u32,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(config.initial_entity_capacity),
            components: ComponentRegistry::new(),
            schedule: Schedule::new(),
            config,
            tick_count: 0,
            ticking: false,
            reset_requested: false,
            #[cfg(feature = "diagnostics")]
            created_this_tick: 0,
            #[cfg(feature = "diagnostics")]
            destroyed_this_tick: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// Create an entity with no components.
    ///
    /// # Panics
    ///
    /// Panics if the entity index space is exhausted.
    pub fn create_entity(&mut self) -> Entity {
        #[cfg(feature = "diagnostics")]
        {
            self.created_this_tick += 1;
        }
        self.entities.create()
    }

    /// Destroy an entity and drop all of its components.
    ///
    /// Returns `true` if the entity was alive. Dead or stale handles are a
    /// no-op returning `false`.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.destroy(entity) {
            return false;
        }
        self.components.remove_entity(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_tick += 1;
        }
        true
    }

    /// Destroy every entity. Systems and component registrations stay.
    pub fn destroy_all(&mut self) {
        let all: Vec<Entity> = self.entities.iter().collect();
        for entity in all {
            self.destroy_entity(entity);
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Iterate over all alive entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach `value` to `entity`, replacing any existing `K` in place.
    ///
    /// Returns the stored component, or `None` (with a warning logged) if the
    /// entity is not alive.
    pub fn add_component<K: Component>(&mut self, entity: Entity, value: K) -> Option<&mut K> {
        if !self.entities.is_alive(entity) {
            log::warn!(
                "Ignoring `{}` added to dead entity {entity}",
                std::any::type_name::<K>()
            );
            return None;
        }
        Some(self.components.store_mut::<K>().insert(entity, value))
    }

    /// Detach and return `entity`'s `K`, if it has one.
    pub fn remove_component<K: Component>(&mut self, entity: Entity) -> Option<K> {
        self.components.existing_store_mut::<K>()?.remove(entity)
    }

    pub fn get_component<K: Component>(&self, entity: Entity) -> Option<&K> {
        self.components.store::<K>()?.get(entity)
    }

    pub fn get_component_mut<K: Component>(&mut self, entity: Entity) -> Option<&mut K> {
        self.components.existing_store_mut::<K>()?.get_mut(entity)
    }

    pub fn has_component<K: Component>(&self, entity: Entity) -> bool {
        self.components
            .store::<K>()
            .is_some_and(|store| store.contains(entity))
    }

    /// Collect all entities that have a component of type `K`, in the store's
    /// dense order.
    pub fn entities_with<K: Component>(&self) -> Vec<Entity> {
        self.components
            .store::<K>()
            .map(|store| store.entities().to_vec())
            .unwrap_or_default()
    }

    /// Read-only access to the store for `K`, if any `K` was ever added.
    pub fn store<K: Component>(&self) -> Option<&ComponentStore<K>> {
        self.components.store::<K>()
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Call `f` for every entity that has all the components in `Q`.
    ///
    /// ```ignore
    /// world.for_each::<(Position, Velocity)>(|entity, (pos, vel)| {
    ///     pos.0 += vel.0 * dt;
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    pub fn for_each<Q: Query>(&mut self, f: impl FnMut(Entity, Q::Item<'_>)) {
        Q::for_each(&mut self.components, f);
    }

    // ── Systems ──────────────────────────────────────────────────────

    /// Register a system to run every tick in `phase`, ordered by `priority`
    /// (lowest first) within the phase. Returns the stored system.
    ///
    /// Systems added while a tick is running start on the next tick.
    pub fn add_system<S: System>(&mut self, phase: SystemPhase, priority: i32, system: S) -> &mut S {
        self.schedule.add(phase, priority, system)
    }

    /// The first registered system of type `S`. Systems of the schedule that
    /// is currently running are not reachable from inside a tick.
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.schedule.get_mut::<S>()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Number of completed ticks since creation or the last reset.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Advance the world by `dt` seconds: run every system once.
    ///
    /// A negative or non-finite `dt` is treated as `0.0`. System failures are
    /// handled per [`WorldConfig::failure_policy`].
    ///
    /// # Panics
    ///
    /// Panics if called from inside a running system.
    pub fn tick(&mut self, dt: f32) -> Result<(), TickError> {
        assert!(!self.ticking, "World::tick called from inside a running system");

        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("Invalid tick delta {dt}, using 0.0");
            0.0
        };

        #[cfg(feature = "diagnostics")]
        {
            self.created_this_tick = 0;
            self.destroyed_this_tick = 0;
        }

        let mut running = std::mem::take(&mut self.schedule);
        self.ticking = true;
        let result = running.run(self, dt);
        self.ticking = false;

        if std::mem::take(&mut self.reset_requested) {
            // Only systems added after the reset survive.
            log::debug!("Dropping {} systems reset during the tick", running.len());
        } else {
            running.append(&mut self.schedule);
            self.schedule = running;
        }

        self.tick_count += 1;
        result
    }

    /// Drop every system, component and entity. The config is kept.
    ///
    /// Handles issued before the reset must be discarded: the same values are
    /// handed out again afterwards.
    pub fn reset(&mut self) {
        self.schedule.clear();
        if self.ticking {
            self.reset_requested = true;
        }
        self.components.clear();
        self.entities.clear();
        self.tick_count = 0;
        log::debug!("World reset");
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Collect a snapshot of entity pool, store and system timing state.
    #[cfg(feature = "diagnostics")]
    pub fn diagnostics_snapshot(&self) -> crate::diag::WorldSnapshot {
        use crate::diag::{EntityPoolStats, StoreStats, WorldSnapshot};

        WorldSnapshot {
            tick: self.tick_count,
            entity_pool: EntityPoolStats {
                total_slots: self.entities.total_slots(),
                free_count: self.entities.free_count(),
                alive_count: self.entities.alive_count(),
                created_this_tick: self.created_this_tick,
                destroyed_this_tick: self.destroyed_this_tick,
            },
            stores: self
                .components
                .store_sizes()
                .into_iter()
                .map(|(name, len)| StoreStats {
                    component: crate::diag::short_type_name(name),
                    len,
                })
                .collect(),
            system_timings: self.schedule.timings.clone(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::FailurePolicy;
    use crate::error::SystemError;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    fn pos(x: f32, y: f32) -> Position {
        Position { x, y }
    }

    #[test]
    fn create_and_query() {
        let mut world = World::new();
        let e1 = world.create_entity();
        world.add_component(e1, pos(1.0, 2.0));
        world.add_component(e1, Velocity { x: 0.5, y: 0.0 });
        let e2 = world.create_entity();
        world.add_component(e2, pos(3.0, 4.0));

        let mut count = 0;
        world.for_each::<(Position, Velocity)>(|entity, (p, v)| {
            assert_eq!(entity, e1);
            p.x += v.x;
            count += 1;
        });
        assert_eq!(count, 1);
        assert_eq!(world.get_component::<Position>(e1), Some(&pos(1.5, 2.0)));
    }

    #[test]
    fn create_and_destroy() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0));
        world.add_component(e, Health(10));
        assert!(world.is_alive(e));
        assert_eq!(world.entity_count(), 1);

        assert!(world.destroy_entity(e));
        assert!(!world.is_alive(e));
        assert_eq!(world.entity_count(), 0);
        assert!(!world.has_component::<Position>(e));
        assert!(!world.has_component::<Health>(e));
        assert_eq!(world.store::<Position>().unwrap().len(), 0);

        // Second destroy is a no-op.
        assert!(!world.destroy_entity(e));
    }

    #[test]
    fn destroy_leaves_other_entities_reachable() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        for (i, &e) in [a, b, c].iter().enumerate() {
            world.add_component(e, Health(i as u32));
        }
        world.destroy_entity(a);
        assert_eq!(world.get_component::<Health>(b), Some(&Health(1)));
        assert_eq!(world.get_component::<Health>(c), Some(&Health(2)));
    }

    #[test]
    fn stale_handle_does_not_alias_recycled_entity() {
        let mut world = World::new();
        let old = world.create_entity();
        world.add_component(old, Health(1));
        world.destroy_entity(old);

        let new = world.create_entity();
        assert_eq!(new.index(), old.index());
        world.add_component(new, Health(2));

        assert!(!world.is_alive(old));
        assert_eq!(world.get_component::<Health>(old), None);
        assert!(!world.has_component::<Health>(old));
        assert_eq!(world.remove_component::<Health>(old), None);
        assert!(!world.destroy_entity(old));
        assert_eq!(world.get_component::<Health>(new), Some(&Health(2)));
    }

    #[test]
    fn add_to_dead_entity_is_ignored() {
        let mut world = World::new();
        let e = world.create_entity();
        world.destroy_entity(e);
        assert!(world.add_component(e, Health(5)).is_none());
        assert!(world.add_component(Entity::NULL, Health(5)).is_none());
        assert!(world.entities_with::<Health>().is_empty());
    }

    #[test]
    fn add_replaces_in_place() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        world.add_component(a, Health(1));
        world.add_component(b, Health(2));
        let before = world.store::<Health>().unwrap().dense_index(a);

        world.add_component(a, Health(100)).unwrap().0 += 1;
        assert_eq!(world.get_component::<Health>(a), Some(&Health(101)));
        assert_eq!(world.store::<Health>().unwrap().dense_index(a), before);
        assert_eq!(world.store::<Health>().unwrap().len(), 2);
    }

    #[test]
    fn remove_component_is_idempotent() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Health(3));
        assert_eq!(world.remove_component::<Health>(e), Some(Health(3)));
        assert_eq!(world.remove_component::<Health>(e), None);
        assert!(world.is_alive(e));
        // Never registered at all.
        assert_eq!(world.remove_component::<Velocity>(e), None);
    }

    #[test]
    fn get_mut_component() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0));
        world.get_component_mut::<Position>(e).unwrap().y = 9.0;
        assert_eq!(world.get_component::<Position>(e).unwrap().y, 9.0);
        assert!(world.get_component_mut::<Velocity>(e).is_none());
    }

    #[test]
    fn entities_with_component() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        let _c = world.create_entity();
        world.add_component(a, Health(1));
        world.add_component(b, Health(2));
        let mut with = world.entities_with::<Health>();
        with.sort();
        assert_eq!(with, vec![a, b]);
        assert!(world.entities_with::<Velocity>().is_empty());
        assert_eq!(world.entities().count(), 3);
    }

    #[test]
    fn destroy_all_keeps_systems_and_stale_handles_dead() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Health(1));
        world.add_system(SystemPhase::Update, 0, |_: &mut World, _: f32| {});

        world.destroy_all();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.schedule().len(), 1);
        let next = world.create_entity();
        assert!(!world.is_alive(e));
        assert!(world.is_alive(next));
    }

    #[test]
    fn tick_runs_systems_and_counts() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0));
        world.add_component(e, Velocity { x: 2.0, y: -1.0 });
        world.add_system(SystemPhase::Update, 0, |world: &mut World, dt: f32| {
            world.for_each::<(Position, Velocity)>(|_, (p, v)| {
                p.x += v.x * dt;
                p.y += v.y * dt;
            });
        });

        world.tick(0.5).unwrap();
        world.tick(0.5).unwrap();
        assert_eq!(world.get_component::<Position>(e), Some(&pos(2.0, -1.0)));
        assert_eq!(world.tick_count(), 2);
    }

    #[test]
    fn invalid_dt_is_clamped() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let log = Rc::clone(&seen);
        world.add_system(SystemPhase::Update, 0, move |_: &mut World, dt: f32| {
            log.borrow_mut().push(dt)
        });
        world.tick(-1.0).unwrap();
        world.tick(f32::NAN).unwrap();
        world.tick(f32::INFINITY).unwrap();
        world.tick(0.25).unwrap();
        assert_eq!(*seen.borrow(), vec![0.0, 0.0, 0.0, 0.25]);
    }

    #[test]
    fn system_added_during_tick_runs_next_tick() {
        let runs = Rc::new(RefCell::new(0));
        let mut world = World::new();
        let counter = Rc::clone(&runs);
        let mut added = false;
        world.add_system(SystemPhase::Update, 0, move |world: &mut World, _: f32| {
            if !added {
                added = true;
                let counter = Rc::clone(&counter);
                world.add_system(SystemPhase::PreUpdate, 0, move |_: &mut World, _: f32| {
                    *counter.borrow_mut() += 1;
                });
            }
        });

        world.tick(0.0).unwrap();
        assert_eq!(*runs.borrow(), 0);
        assert_eq!(world.schedule().len(), 2);
        world.tick(0.0).unwrap();
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn reset_inside_tick_drops_schedule() {
        let mut world = World::new();
        for _ in 0..3 {
            let e = world.create_entity();
            world.add_component(e, Health(1));
        }
        world.add_system(SystemPhase::Update, 0, |world: &mut World, _: f32| world.reset());
        world.add_system(SystemPhase::Update, 1, |world: &mut World, _: f32| {
            // Still runs this tick, on an empty world.
            assert_eq!(world.entity_count(), 0);
        });

        world.tick(0.0).unwrap();
        assert!(world.schedule().is_empty());
        assert_eq!(world.entity_count(), 0);
        assert!(world.store::<Health>().is_none());
    }

    #[test]
    fn reset_outside_tick_clears_everything() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Health(1));
        world.add_system(SystemPhase::Update, 0, |_: &mut World, _: f32| {});
        world.tick(0.0).unwrap();

        world.reset();
        assert_eq!(world.entity_count(), 0);
        assert!(world.schedule().is_empty());
        assert_eq!(world.components().store_count(), 0);
        assert_eq!(world.tick_count(), 0);
        // Allocation starts over.
        assert_eq!(world.create_entity().index(), 1);
    }

    #[test]
    #[should_panic(expected = "inside a running system")]
    fn nested_tick_panics() {
        let mut world = World::new();
        world.add_system(SystemPhase::Update, 0, |world: &mut World, _: f32| {
            let _ = world.tick(0.0);
        });
        let _ = world.tick(0.0);
    }

    struct Failing;

    impl System for Failing {
        fn update(&mut self, _world: &mut World, _dt: f32) -> Result<(), SystemError> {
            Err(SystemError::message("nope"))
        }
    }

    #[test]
    fn failing_system_keeps_schedule() {
        let mut world = World::new();
        world.add_system(SystemPhase::Update, 0, Failing);
        assert!(world.tick(0.0).is_err());
        assert_eq!(world.schedule().len(), 1);
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn log_and_continue_from_config() {
        let config = WorldConfig::new().with_failure_policy(FailurePolicy::LogAndContinue);
        let mut world = World::with_config(config);
        world.add_system(SystemPhase::Update, 0, Failing);
        let err = world.tick(0.0).unwrap_err();
        assert!(matches!(err, TickError::SystemsFailed { .. }));
    }

    #[derive(Default)]
    struct Gravity {
        strength: f32,
    }

    impl System for Gravity {
        fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
            let g = self.strength;
            world.for_each::<(Velocity,)>(|_, (v,)| v.y -= g * dt);
            Ok(())
        }
    }

    #[test]
    fn system_mut_reaches_registered_system() {
        let mut world = World::new();
        world.add_system(SystemPhase::Update, 0, Gravity::default()).strength = 10.0;
        let e = world.create_entity();
        world.add_component(e, Velocity { x: 0.0, y: 0.0 });
        world.tick(0.1).unwrap();
        assert_eq!(world.get_component::<Velocity>(e).unwrap().y, -1.0);

        world.system_mut::<Gravity>().unwrap().strength = 0.0;
        world.tick(0.1).unwrap();
        assert_eq!(world.get_component::<Velocity>(e).unwrap().y, -1.0);
    }

    #[test]
    fn config_capacity_does_not_change_behaviour() {
        let mut world = World::with_config(WorldConfig::new().with_initial_entity_capacity(64));
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.create_entity().index(), 1);
        assert_eq!(world.config().initial_entity_capacity, 64);
    }

    #[test]
    fn oversized_capacity_is_clamped() {
        let mut world = World::with_config(WorldConfig::new().with_initial_entity_capacity(usize::MAX));
        assert_eq!(world.create_entity().index(), 1);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn snapshot_reports_pool_and_stores() {
        let mut world = World::new();
        world.add_system(SystemPhase::Update, 0, |world: &mut World, _: f32| {
            let e = world.create_entity();
            world.add_component(e, Health(1));
        });
        let doomed = world.create_entity();
        world.tick(0.0).unwrap();
        world.destroy_entity(doomed);

        let snapshot = world.diagnostics_snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.entity_pool.alive_count, 1);
        assert_eq!(snapshot.entity_pool.free_count, 1);
        assert_eq!(snapshot.entity_pool.created_this_tick, 1);
        assert_eq!(snapshot.entity_pool.destroyed_this_tick, 1);
        assert_eq!(snapshot.stores.len(), 1);
        assert_eq!(snapshot.stores[0].component, "Health");
        assert_eq!(snapshot.stores[0].len, 1);
        assert_eq!(snapshot.system_timings.len(), 1);
    }
}
