//! World configuration.
//!
//! Everything has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "failure_policy": "log_and_continue", "fixed_timestep": 0.02 }
//! ```

use serde::{Deserialize, Serialize};

use crate::ecs::entity::Entity;
use crate::error::ConfigError;

/// What the schedule does when a system returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the tick at the first failure and hand the error to the caller.
    #[default]
    Abort,
    /// Log each failure and keep running the remaining systems.
    LogAndContinue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Identity slots reserved up front.
    pub initial_entity_capacity: usize,
    pub failure_policy: FailurePolicy,
    /// Seconds per fixed step for [`ScriptSystem`](crate::ecs::script::ScriptSystem).
    pub fixed_timestep: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: 0,
            failure_policy: FailurePolicy::Abort,
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

impl WorldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_entity_capacity > Entity::MAX_INDEX as usize {
            return Err(ConfigError::Invalid(format!(
                "initial_entity_capacity must be at most {}, got {}",
                Entity::MAX_INDEX,
                self.initial_entity_capacity
            )));
        }
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be a positive number of seconds, got {}",
                self.fixed_timestep
            )));
        }
        Ok(())
    }

    pub fn with_initial_entity_capacity(mut self, capacity: usize) -> Self {
        self.initial_entity_capacity = capacity;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_fixed_timestep(mut self, seconds: f32) -> Self {
        self.fixed_timestep = seconds;
        self
    }
}
