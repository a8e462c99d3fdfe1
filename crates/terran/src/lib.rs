//! # Terran — Sparse-Set ECS Runtime
//!
//! The entity/component/system core of a small real-time 2D engine: entity
//! handles with generation counters, one packed store per component kind,
//! closure-based queries and a phase/priority system schedule.
//!
//! Start with `use terran::prelude::*`, build a [`World`](ecs::World), add
//! components and systems, and call [`tick`](ecs::World::tick) once per frame.

pub mod config;
pub mod ecs;
pub mod error;
pub mod math;
pub mod prelude;

#[cfg(feature = "diagnostics")]
pub mod diag;
