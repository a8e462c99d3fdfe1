//! # Query — Iterating Over Entities by Component Kind
//!
//! Queries are how systems read and write component data. A query names a
//! tuple of component kinds, and the world visits every entity that holds all
//! of them.
//!
//! ## How Queries Work
//!
//! ```text
//! world.for_each::<(Position, Velocity)>(|entity, (pos, vel)| {
//!     pos.x += vel.x;
//! });
//!
//! 1. Take the Position store (the "driver") and the Velocity store out of
//!    the registry.
//! 2. Walk the driver's dense array. For each owner, look it up in Velocity.
//! 3. Only owners present in every store reach the closure, with `&mut` to
//!    each component in the order the kinds were listed.
//! 4. Put the stores back.
//! ```
//!
//! The first kind listed is always the driver. Listing the most selective
//! kind first makes the query cheaper, but nothing picks it for you.
//! Single-kind queries skip the membership checks and just scan the store.
//!
//! Visiting order is the driver's dense order, which changes whenever that
//! store has a component removed. Don't rely on it across frames.
//!
//! ## Closure-Based Design
//!
//! Rust's `Iterator` can't yield items that borrow from the iterator itself,
//! and handing out `&mut` into several stores of one registry at once needs
//! the borrow checker to see them as disjoint. Taking the stores out of the
//! registry for the duration of the walk gives exactly that, with no unsafe.
//!
//! If the closure panics the taken stores are lost with the unwinding stack,
//! so a world is not usable after a panicking query.

use std::any::TypeId;

use super::component::Component;
use super::entity::Entity;
use super::registry::ComponentRegistry;

/// A tuple of component kinds that can be iterated together.
///
/// Implemented for tuples of 1 to 8 component types. Each yielded item is a
/// tuple of `&mut` references in the same order.
pub trait Query {
    /// The per-entity item: `(&mut A, &mut B, ...)`.
    type Item<'w>;

    /// The `TypeId` of every kind in the query, in order.
    fn type_ids() -> Vec<TypeId>;

    /// Call `f` for every entity holding all kinds.
    ///
    /// # Panics
    ///
    /// Panics if the same kind is listed more than once.
    fn for_each<F>(registry: &mut ComponentRegistry, f: F)
    where
        F: FnMut(Entity, Self::Item<'_>);
}

impl<A: Component> Query for (A,) {
    type Item<'w> = (&'w mut A,);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<A>()]
    }

    fn for_each<F>(registry: &mut ComponentRegistry, mut f: F)
    where
        F: FnMut(Entity, Self::Item<'_>),
    {
        // Fast path: every entry of the only store matches.
        if let Some(store) = registry.existing_store_mut::<A>() {
            for (entity, a) in store.iter_mut() {
                f(entity, (a,));
            }
        }
    }
}

/// Panic if a query lists the same kind twice.
fn assert_distinct(ids: &[TypeId], query_name: &str) {
    for (i, id) in ids.iter().enumerate() {
        if ids[i + 1..].contains(id) {
            panic!("Query `{query_name}` lists the same component kind more than once");
        }
    }
}

macro_rules! impl_query_tuple {
    ($($Rest:ident),+) => {
        impl<Lead: Component, $($Rest: Component),+> Query for (Lead, $($Rest,)+) {
            type Item<'w> = (&'w mut Lead, $(&'w mut $Rest,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![TypeId::of::<Lead>(), $(TypeId::of::<$Rest>()),+]
            }

            #[allow(non_snake_case)]
            fn for_each<F>(registry: &mut ComponentRegistry, mut f: F)
            where
                F: FnMut(Entity, Self::Item<'_>),
            {
                assert_distinct(&Self::type_ids(), std::any::type_name::<Self>());

                let mut lead = registry.take::<Lead>();
                $(let mut $Rest = registry.take::<$Rest>();)+

                // A kind with no store means no entity can match.
                if let (Some(lead), $(Some($Rest),)+) =
                    (lead.as_deref_mut(), $($Rest.as_deref_mut(),)+)
                {
                    for (entity, lead_value) in lead.iter_mut() {
                        if let ($(Some($Rest),)+) = ($($Rest.get_mut(entity),)+) {
                            f(entity, (lead_value, $($Rest,)+));
                        }
                    }
                }

                if let Some(store) = lead {
                    registry.restore(store);
                }
                $(
                    if let Some(store) = $Rest {
                        registry.restore(store);
                    }
                )+
            }
        }
    };
}

impl_query_tuple!(B);
impl_query_tuple!(B, C);
impl_query_tuple!(B, C, D);
impl_query_tuple!(B, C, D, E);
impl_query_tuple!(B, C, D, E, G);
impl_query_tuple!(B, C, D, E, G, H);
impl_query_tuple!(B, C, D, E, G, H, I);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    #[derive(Debug, PartialEq)]
    struct Velocity(i32);
    #[derive(Debug, PartialEq)]
    struct Health(u32);

    fn e(index: u32) -> Entity {
        Entity::from_parts(index, 0)
    }

    fn registry() -> ComponentRegistry {
        let mut reg = ComponentRegistry::new();
        for i in 1..=6 {
            reg.store_mut::<Position>().insert(e(i), Position(i as i32));
        }
        // Only even entities move.
        for i in [2, 4, 6] {
            reg.store_mut::<Velocity>().insert(e(i), Velocity(10 * i as i32));
        }
        // Health on 3, 4 and an entity with nothing else.
        reg.store_mut::<Health>().insert(e(3), Health(30));
        reg.store_mut::<Health>().insert(e(4), Health(40));
        reg.store_mut::<Health>().insert(e(9), Health(90));
        reg
    }

    #[test]
    fn type_ids_follow_tuple_order() {
        assert_eq!(<(Health,)>::type_ids(), vec![TypeId::of::<Health>()]);
        assert_eq!(
            <(Velocity, Position)>::type_ids(),
            vec![TypeId::of::<Velocity>(), TypeId::of::<Position>()]
        );
    }

    #[test]
    fn single_kind_visits_all() {
        let mut reg = registry();
        let mut seen = Vec::new();
        <(Position,)>::for_each(&mut reg, |entity, (p,)| seen.push((entity.index(), p.0)));
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|&(i, p)| i as i32 == p));
    }

    #[test]
    fn pair_visits_only_full_matches() {
        let mut reg = registry();
        let mut seen = Vec::new();
        <(Position, Velocity)>::for_each(&mut reg, |entity, (p, v)| {
            assert_eq!(v.0, p.0 * 10);
            seen.push(entity.index());
        });
        seen.sort();
        assert_eq!(seen, vec![2, 4, 6]);
    }

    #[test]
    fn order_of_kinds_is_preserved_in_item() {
        let mut reg = registry();
        let mut seen = Vec::new();
        <(Velocity, Position)>::for_each(&mut reg, |entity, (v, p)| {
            seen.push((entity.index(), v.0, p.0));
        });
        seen.sort();
        assert_eq!(seen, vec![(2, 20, 2), (4, 40, 4), (6, 60, 6)]);
    }

    #[test]
    fn triple_intersection() {
        let mut reg = registry();
        let mut seen = Vec::new();
        <(Health, Position, Velocity)>::for_each(&mut reg, |entity, (h, _, _)| {
            seen.push((entity.index(), h.0));
        });
        assert_eq!(seen, vec![(4, 40)]);
    }

    #[test]
    fn mutation_through_query_sticks() {
        let mut reg = registry();
        <(Position, Velocity)>::for_each(&mut reg, |_, (p, v)| p.0 += v.0);
        let store = reg.store::<Position>().unwrap();
        assert_eq!(store.get(e(2)), Some(&Position(22)));
        assert_eq!(store.get(e(1)), Some(&Position(1)));
    }

    #[test]
    fn stores_restored_after_query() {
        let mut reg = registry();
        <(Position, Velocity, Health)>::for_each(&mut reg, |_, _| {});
        assert_eq!(reg.store::<Position>().unwrap().len(), 6);
        assert_eq!(reg.store::<Velocity>().unwrap().len(), 3);
        assert_eq!(reg.store::<Health>().unwrap().len(), 3);
    }

    #[test]
    fn missing_store_visits_nothing() {
        struct Unused;
        let mut reg = registry();
        let mut count = 0;
        <(Position, Unused)>::for_each(&mut reg, |_, _| count += 1);
        <(Unused,)>::for_each(&mut reg, |_, _| count += 1);
        assert_eq!(count, 0);
        // The stores that did exist are back in place.
        assert!(reg.store::<Position>().is_some());
    }

    #[test]
    #[should_panic(expected = "more than once")]
    fn duplicate_kind_panics() {
        let mut reg = registry();
        <(Position, Position)>::for_each(&mut reg, |_, _| {});
    }
}
