//! # Entity Hierarchies — Children That Follow Their Parent
//!
//! An entity with a [`Relationship`] and a [`Transform2D`] is positioned
//! relative to its parent's transform each tick by the [`HierarchySystem`].
//!
//! ## Usage
//!
//! ```ignore
//! let ship = world.create_entity();
//! world.add_component(ship, Transform2D::from_xy(100.0, 50.0));
//!
//! let turret = world.create_entity();
//! world.add_component(turret, Transform2D::IDENTITY);
//! world.add_component(turret, Relationship::child_of(ship, Vec2::new(0.0, 8.0)));
//!
//! world.add_system(SystemPhase::PostUpdate, 0, HierarchySystem);
//! world.tick(dt)?; // turret.position == (100, 58)
//! ```
//!
//! Only the parent's position is combined with the offset; scale and rotation
//! are copied over when inherited, never composed. Children are processed in
//! the `Relationship` store's order and a child that is itself a parent is
//! read with whatever value it has at that point, so deep chains may lag a
//! tick behind.

use crate::ecs::entity::Entity;
use crate::ecs::system::System;
use crate::ecs::world::World;
use crate::error::SystemError;
use crate::math::{Transform2D, Vec2};

/// Links an entity to a parent whose transform it follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relationship {
    /// `None` means the entity is a root and the system leaves it alone.
    pub parent: Option<Entity>,
    /// Added to the parent's position.
    pub offset: Vec2,
    pub inherit_scale: bool,
    pub inherit_rotation: bool,
}

impl Relationship {
    pub fn child_of(parent: Entity, offset: Vec2) -> Self {
        Self {
            parent: Some(parent),
            offset,
            ..Self::default()
        }
    }

    pub fn with_inherit_scale(mut self, inherit: bool) -> Self {
        self.inherit_scale = inherit;
        self
    }

    pub fn with_inherit_rotation(mut self, inherit: bool) -> Self {
        self.inherit_rotation = inherit;
        self
    }

    fn apply(&self, parent: &Transform2D, child: &mut Transform2D) {
        child.position = parent.position + self.offset;
        if self.inherit_scale {
            child.scale = parent.scale;
        }
        if self.inherit_rotation {
            child.rotation = parent.rotation;
        }
    }
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            parent: None,
            offset: Vec2::ZERO,
            inherit_scale: true,
            inherit_rotation: false,
        }
    }
}

/// Moves every child to its parent's position plus offset.
///
/// Children with no parent, a dead parent, or a parent without a
/// `Transform2D` are left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct HierarchySystem;

impl System for HierarchySystem {
    fn update(&mut self, world: &mut World, _dt: f32) -> Result<(), SystemError> {
        // Parent and child transforms live in the same store, so gather the
        // links first and apply them one at a time.
        let mut links: Vec<(Entity, Relationship)> = Vec::new();
        world.for_each::<(Relationship, Transform2D)>(|entity, (relationship, _)| {
            if relationship.parent.is_some() {
                links.push((entity, *relationship));
            }
        });

        for (child, relationship) in links {
            let Some(parent) = relationship.parent else {
                continue;
            };
            if !world.is_alive(parent) {
                continue;
            }
            let Some(parent_transform) = world.get_component::<Transform2D>(parent).copied() else {
                continue;
            };
            if let Some(child_transform) = world.get_component_mut::<Transform2D>(child) {
                relationship.apply(&parent_transform, child_transform);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::system::SystemPhase;

    fn setup() -> (World, Entity) {
        let mut world = World::new();
        world.add_system(SystemPhase::PostUpdate, 0, HierarchySystem);
        let parent = world.create_entity();
        world.add_component(
            parent,
            Transform2D::from_xy(100.0, 50.0)
                .with_scale(2.0)
                .with_rotation(1.5),
        );
        (world, parent)
    }

    #[test]
    fn child_follows_parent_with_offset() {
        let (mut world, parent) = setup();
        let child = world.create_entity();
        world.add_component(child, Transform2D::IDENTITY);
        world.add_component(child, Relationship::child_of(parent, Vec2::new(0.0, 8.0)));

        world.tick(0.016).unwrap();
        let t = world.get_component::<Transform2D>(child).unwrap();
        assert_eq!(t.position, Vec2::new(100.0, 58.0));
        // Scale inherited by default, rotation not.
        assert_eq!(t.scale, Vec2::splat(2.0));
        assert_eq!(t.rotation, 0.0);
    }

    #[test]
    fn inherit_flags() {
        let (mut world, parent) = setup();
        let child = world.create_entity();
        world.add_component(child, Transform2D::IDENTITY.with_scale(3.0));
        world.add_component(
            child,
            Relationship::child_of(parent, Vec2::ZERO)
                .with_inherit_scale(false)
                .with_inherit_rotation(true),
        );

        world.tick(0.016).unwrap();
        let t = world.get_component::<Transform2D>(child).unwrap();
        assert_eq!(t.scale, Vec2::splat(3.0));
        assert_eq!(t.rotation, 1.5);
    }

    #[test]
    fn follows_parent_movement_each_tick() {
        let (mut world, parent) = setup();
        let child = world.create_entity();
        world.add_component(child, Transform2D::IDENTITY);
        world.add_component(child, Relationship::child_of(parent, Vec2::new(1.0, 0.0)));

        world.tick(0.016).unwrap();
        world.get_component_mut::<Transform2D>(parent).unwrap().position = Vec2::new(-5.0, 0.0);
        world.tick(0.016).unwrap();
        assert_eq!(
            world.get_component::<Transform2D>(child).unwrap().position,
            Vec2::new(-4.0, 0.0)
        );
    }

    #[test]
    fn orphans_are_untouched() {
        let (mut world, parent) = setup();
        let start = Transform2D::from_xy(7.0, 7.0);

        // No parent at all.
        let root = world.create_entity();
        world.add_component(root, start);
        world.add_component(root, Relationship::default());

        // Dead parent.
        let doomed = world.create_entity();
        world.add_component(doomed, Transform2D::IDENTITY);
        let orphan = world.create_entity();
        world.add_component(orphan, start);
        world.add_component(orphan, Relationship::child_of(doomed, Vec2::ZERO));
        world.destroy_entity(doomed);

        // Parent without a transform.
        let bare = world.create_entity();
        let detached = world.create_entity();
        world.add_component(detached, start);
        world.add_component(detached, Relationship::child_of(bare, Vec2::ZERO));

        world.tick(0.016).unwrap();
        for e in [root, orphan, detached] {
            assert_eq!(world.get_component::<Transform2D>(e), Some(&start));
        }
        assert!(world.is_alive(parent));
    }

    #[test]
    fn relationship_without_transform_is_skipped() {
        let (mut world, parent) = setup();
        let child = world.create_entity();
        world.add_component(child, Relationship::child_of(parent, Vec2::ZERO));
        world.tick(0.016).unwrap();
        assert!(!world.has_component::<Transform2D>(child));
    }
}
