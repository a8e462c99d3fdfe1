//! # System — Update Logic Run Once Per Tick
//!
//! A system is a value with an `update(&mut World, dt)` method. Any
//! `FnMut(&mut World, f32)` closure or function already is one; stateful or
//! fallible systems implement [`System`] on their own type.
//!
//! ## Ordering
//!
//! Every system is registered with a [`SystemPhase`] and an `i32` priority.
//! The [`Schedule`] runs them sorted by `(phase, priority)`, lowest first.
//! Systems with the same phase and priority run in the order they were added,
//! no matter how many times the schedule is re-sorted:
//!
//! ```text
//! add(Update,  5, a)
//! add(Update,  1, b)        run order: b, a, c, d
//! add(PostUpdate, 0, c)
//! add(PostUpdate, 0, d)
//! ```
//!
//! Adding a system only marks the schedule dirty. The (stable) sort happens
//! at the start of the next run, so adding many systems at setup sorts once.
//!
//! ## Failures
//!
//! A system returning `Err` is handled per the world's
//! [`FailurePolicy`]: stop the tick and report it (`Abort`), or log it and
//! carry on with the rest (`LogAndContinue`). Panics are not caught.
//!
//! ## Comparison
//!
//! - **hecs**: No scheduling at all; you call your functions yourself.
//! - **bevy_ecs**: Schedules with sets, run conditions, ordering constraints
//!   and parallel execution.
//!
//! Phase + priority is the smallest thing that still lets an engine put its
//! own systems (hierarchy, scripts) at fixed points around user code.

use std::any::Any;
use std::fmt;

use serde::Serialize;

use super::world::World;
use crate::config::FailurePolicy;
use crate::error::{SystemError, SystemFailure, TickError};

/// Coarse ordering bucket for systems. Phases run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum SystemPhase {
    PreUpdate = 0,
    #[default]
    Update = 1,
    PostUpdate = 2,
    Render = 3,
}

impl fmt::Display for SystemPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Something that runs once per tick.
pub trait System: 'static {
    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError>;

    /// Name used in errors, logs and diagnostics. Defaults to the type name
    /// without its module path.
    fn name(&self) -> String {
        short_system_name(std::any::type_name::<Self>())
    }
}

/// Blanket impl: any `FnMut(&mut World, f32)` is an infallible `System`.
impl<F: FnMut(&mut World, f32) + 'static> System for F {
    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
        (self)(world, dt);
        Ok(())
    }
}

/// `System` plus the `Any` access the schedule needs to hand back `&mut S`.
trait AnySystem {
    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> AnySystem for S {
    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
        System::update(self, world, dt)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct SystemEntry {
    name: String,
    phase: SystemPhase,
    priority: i32,
    system: Box<dyn AnySystem>,
}

impl SystemEntry {
    fn key(&self) -> (SystemPhase, i32) {
        (self.phase, self.priority)
    }
}

/// Per-system timing recorded during a single run.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub phase: SystemPhase,
    pub duration_us: f64,
}

/// The systems of a world, in run order once sorted.
#[derive(Default)]
pub struct Schedule {
    entries: Vec<SystemEntry>,
    dirty: bool,
    /// Per-system timings from the most recent `run()` call.
    #[cfg(feature = "diagnostics")]
    pub(crate) timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system and return it for further configuration.
    pub fn add<S: System>(&mut self, phase: SystemPhase, priority: i32, system: S) -> &mut S {
        let name = system.name();
        log::debug!("Adding system `{name}` to {phase} at priority {priority}");
        self.entries.push(SystemEntry {
            name,
            phase,
            priority,
            system: Box::new(system),
        });
        self.dirty = true;

        let last = self.entries.len() - 1;
        (*self.entries[last].system)
            .as_any_mut()
            .downcast_mut::<S>()
            .unwrap_or_else(|| unreachable!("freshly added system has the wrong type"))
    }

    /// The first registered system of type `S`, in registration order.
    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        self.entries
            .iter_mut()
            .find_map(|e| (*e.system).as_any_mut().downcast_mut::<S>())
    }

    /// Run every system once, in `(phase, priority, insertion)` order.
    pub fn run(&mut self, world: &mut World, dt: f32) -> Result<(), TickError> {
        self.sort_if_dirty();
        let policy = world.config().failure_policy;
        let mut failures = Vec::new();

        #[cfg(feature = "diagnostics")]
        self.timings.clear();

        for entry in &mut self.entries {
            #[cfg(feature = "diagnostics")]
            let start = std::time::Instant::now();

            let result = AnySystem::update(&mut *entry.system, world, dt);

            #[cfg(feature = "diagnostics")]
            self.timings.push(SystemTiming {
                name: entry.name.clone(),
                phase: entry.phase,
                duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
            });

            let Err(error) = result else { continue };
            match policy {
                FailurePolicy::Abort => {
                    return Err(TickError::SystemFailed {
                        system: entry.name.clone(),
                        phase: entry.phase,
                        source: error,
                    });
                }
                FailurePolicy::LogAndContinue => {
                    log::error!("System `{}` failed in {}: {}", entry.name, entry.phase, error);
                    failures.push(SystemFailure {
                        system: entry.name.clone(),
                        phase: entry.phase,
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TickError::SystemsFailed { failures })
        }
    }

    /// Move every system of `other` to the end of this schedule.
    pub(crate) fn append(&mut self, other: &mut Schedule) {
        if other.entries.is_empty() {
            return;
        }
        self.entries.append(&mut other.entries);
        self.dirty = true;
    }

    /// Drop every system.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty = false;
        #[cfg(feature = "diagnostics")]
        self.timings.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// System names in the order the next run will use.
    pub fn names(&self) -> Vec<&str> {
        let mut order: Vec<&SystemEntry> = self.entries.iter().collect();
        if self.dirty {
            order.sort_by_key(|e| e.key());
        }
        order.into_iter().map(|e| e.name.as_str()).collect()
    }

    fn sort_if_dirty(&mut self) {
        if self.dirty {
            // Stable, so equal keys keep insertion order.
            self.entries.sort_by_key(SystemEntry::key);
            self.dirty = false;
            log::debug!("Schedule sorted ({} systems)", self.entries.len());
        }
    }
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// last meaningful segment (e.g. `game::movement_system` → `movement_system`,
/// `{{closure}}` → `<closure>`).
pub(crate) fn short_system_name(full: &str) -> String {
    // Generic arguments may contain `::` themselves.
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
