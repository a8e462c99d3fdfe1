//! Error types.
//!
//! Lookups on the world never error: a missing entity or component is an
//! `Option::None` or `false`. Errors only come out of the two places where the
//! caller has to react to something going wrong: a system failing during a
//! tick, and a configuration that doesn't parse.

use crate::ecs::entity::Entity;
use crate::ecs::system::SystemPhase;

/// What a fallible [`System`](crate::ecs::system::System) returns on failure.
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    #[error("{0}")]
    Message(String),

    /// The system expected `entity` to carry a component it didn't have.
    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    /// The system was handed an entity that is no longer alive.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),
}

impl SystemError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Shorthand for [`SystemError::MissingComponent`] naming `T`.
    pub fn missing<T>(entity: Entity) -> Self {
        Self::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}

/// One failed system, recorded under [`FailurePolicy::LogAndContinue`](crate::config::FailurePolicy).
#[derive(Debug)]
pub struct SystemFailure {
    pub system: String,
    pub phase: SystemPhase,
    pub error: SystemError,
}

/// Returned by [`World::tick`](crate::ecs::world::World::tick) when a system fails.
#[derive(thiserror::Error, Debug)]
pub enum TickError {
    /// The tick stopped at the first failing system.
    #[error("system `{system}` failed in {phase}: {source}")]
    SystemFailed {
        system: String,
        phase: SystemPhase,
        #[source]
        source: SystemError,
    },

    /// Every system ran; these ones failed.
    #[error("{} system(s) failed during the tick", .failures.len())]
    SystemsFailed { failures: Vec<SystemFailure> },
}

impl TickError {
    /// Names of the systems that failed, in run order.
    pub fn failed_systems(&self) -> Vec<&str> {
        match self {
            Self::SystemFailed { system, .. } => vec![system.as_str()],
            Self::SystemsFailed { failures } => {
                failures.iter().map(|f| f.system.as_str()).collect()
            }
        }
    }
}

/// Errors loading a [`WorldConfig`](crate::config::WorldConfig).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
