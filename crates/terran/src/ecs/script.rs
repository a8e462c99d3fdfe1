//! # Scripts — Per-Entity Behaviours
//!
//! A [`Behaviour`] is gameplay code attached to one entity through a
//! [`Script`] component. The [`ScriptSystem`] drives its hooks:
//!
//! ```text
//! tick(dt)
//!   1. awake         once, the first tick the script is seen
//!   2. start         once, right after awake
//!   3. fixed_update  once per whole fixed step accumulated from dt
//!   4. update(dt)    every tick
//! ```
//!
//! Each pass runs over the entities holding a `Script` at the start of that
//! pass. A hook gets `&mut World`, so it can create and destroy entities,
//! add components, even remove its own `Script`. While a hook runs its
//! behaviour is moved out of the component and put back afterwards, provided
//! the entity and its `Script` are still there.

use crate::config::WorldConfig;
use crate::ecs::entity::Entity;
use crate::ecs::system::System;
use crate::ecs::world::World;
use crate::error::SystemError;

/// Gameplay code attached to an entity. Every hook is optional.
pub trait Behaviour: 'static {
    /// Called once, the first time the script system sees this behaviour.
    fn awake(&mut self, _entity: Entity, _world: &mut World) {}

    /// Called once after `awake`, before the first `update`.
    fn start(&mut self, _entity: Entity, _world: &mut World) {}

    /// Called every tick with the tick's delta.
    fn update(&mut self, _entity: Entity, _world: &mut World, _dt: f32) {}

    /// Called once per fixed step, with the fixed step length.
    fn fixed_update(&mut self, _entity: Entity, _world: &mut World, _fixed_dt: f32) {}
}

/// Component that attaches a [`Behaviour`] to an entity.
pub struct Script {
    /// `None` only while one of the behaviour's hooks is running.
    behaviour: Option<Box<dyn Behaviour>>,
    awake: bool,
    started: bool,
}

impl Script {
    pub fn new(behaviour: impl Behaviour) -> Self {
        Self {
            behaviour: Some(Box::new(behaviour)),
            awake: false,
            started: false,
        }
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

#[derive(Clone, Copy)]
enum Pass {
    Awake,
    Start,
    FixedUpdate(f32),
    Update(f32),
}

impl Pass {
    fn wants(self, script: &Script) -> bool {
        match self {
            Pass::Awake => !script.awake,
            Pass::Start => script.awake && !script.started,
            Pass::FixedUpdate(_) | Pass::Update(_) => script.started,
        }
    }
}

/// Most fixed steps a single tick will run. Time accumulated beyond that is
/// dropped with a warning, so one huge delta can't stall the tick.
pub const MAX_FIXED_STEPS_PER_TICK: u32 = 240;

/// Runs every [`Script`]'s hooks once per tick.
#[derive(Debug, Clone)]
pub struct ScriptSystem {
    fixed_timestep: f32,
    /// Seconds not yet consumed by a fixed step. Always in `[0, fixed_timestep)`
    /// between ticks.
    accumulator: f64,
}

impl ScriptSystem {
    /// # Panics
    ///
    /// Panics if `fixed_timestep` is not a positive number of seconds.
    pub fn new(fixed_timestep: f32) -> Self {
        assert!(
            fixed_timestep.is_finite() && fixed_timestep > 0.0,
            "fixed_timestep must be positive, got {fixed_timestep}"
        );
        Self {
            fixed_timestep,
            accumulator: 0.0,
        }
    }

    /// Uses [`WorldConfig::fixed_timestep`].
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.fixed_timestep)
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    /// Add `dt` to the accumulator and return how many whole fixed steps it
    /// now holds, keeping the remainder.
    fn consume_fixed_steps(&mut self, dt: f32) -> u32 {
        let step = f64::from(self.fixed_timestep);
        self.accumulator += f64::from(dt);
        let whole = (self.accumulator / step).floor();
        self.accumulator = (self.accumulator - whole * step).clamp(0.0, step);
        if self.accumulator >= step {
            self.accumulator = 0.0;
        }

        let cap = f64::from(MAX_FIXED_STEPS_PER_TICK);
        if whole > cap {
            log::warn!(
                "ScriptSystem fell behind by {whole} fixed steps; running {MAX_FIXED_STEPS_PER_TICK} and dropping {:.3}s",
                (whole - cap) * step
            );
            return MAX_FIXED_STEPS_PER_TICK;
        }
        whole as u32
    }

    fn run_pass(world: &mut World, pass: Pass) {
        for entity in world.entities_with::<Script>() {
            // Destroyed, or its Script removed, earlier in this pass.
            let Some(script) = world.get_component_mut::<Script>(entity) else {
                continue;
            };
            if !pass.wants(script) {
                continue;
            }
            let Some(mut behaviour) = script.behaviour.take() else {
                continue;
            };

            match pass {
                Pass::Awake => behaviour.awake(entity, world),
                Pass::Start => behaviour.start(entity, world),
                Pass::FixedUpdate(fixed_dt) => behaviour.fixed_update(entity, world, fixed_dt),
                Pass::Update(dt) => behaviour.update(entity, world, dt),
            }

            // If the hook replaced the Script, the new one is kept as is.
            if let Some(script) = world.get_component_mut::<Script>(entity) {
                if script.behaviour.is_none() {
                    script.behaviour = Some(behaviour);
                    match pass {
                        Pass::Awake => script.awake = true,
                        Pass::Start => script.started = true,
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Default for ScriptSystem {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

impl System for ScriptSystem {
    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
        Self::run_pass(world, Pass::Awake);
        Self::run_pass(world, Pass::Start);
        for _ in 0..self.consume_fixed_steps(dt) {
            Self::run_pass(world, Pass::FixedUpdate(self.fixed_timestep));
        }
        Self::run_pass(world, Pass::Update(dt));
        Ok(())
    }
}
