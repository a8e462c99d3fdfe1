//! Convenience re-exports — `use terran::prelude::*` for the common items.

pub use crate::config::{FailurePolicy, WorldConfig};
pub use crate::ecs::{
    Behaviour, Component, Entity, HierarchySystem, Relationship, Schedule, Script, ScriptSystem,
    System, SystemPhase, World,
};
pub use crate::error::{SystemError, TickError};
pub use crate::math::{Mat3, Transform2D, Vec2};
