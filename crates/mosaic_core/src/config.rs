//! # World Configuration
//!
//! Static limits and initial capacities, fixed before the first
//! registration. Usually built in code; may be loaded once at startup from
//! TOML.
//!
//! ```toml
//! max_components = 32
//! max_systems = 16
//! initial_entity_capacity = 1024
//! ```

use serde::Deserialize;

use crate::ecs::{MAX_COMPONENTS, MAX_SYSTEMS};
use crate::error::{EcsError, EcsResult};

/// Limits and initial capacities of a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Maximum number of component types, at most [`MAX_COMPONENTS`].
    pub max_components: usize,
    /// Maximum number of systems, at most [`MAX_SYSTEMS`].
    pub max_systems: usize,
    /// Initial entity metadata and component storage capacity.
    pub initial_entity_capacity: usize,
    /// Initial sparse capacity of each system's member set.
    pub initial_system_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_components: MAX_COMPONENTS,
            max_systems: MAX_SYSTEMS,
            initial_entity_capacity: 1024,
            initial_system_capacity: 1024,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the document does not parse or
    /// fails [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the component type limit.
    #[must_use]
    pub fn with_max_components(mut self, max_components: usize) -> Self {
        self.max_components = max_components;
        self
    }

    /// Sets the system limit.
    #[must_use]
    pub fn with_max_systems(mut self, max_systems: usize) -> Self {
        self.max_systems = max_systems;
        self
    }

    /// Sets the initial entity capacity.
    #[must_use]
    pub fn with_initial_entity_capacity(mut self, capacity: usize) -> Self {
        self.initial_entity_capacity = capacity;
        self
    }

    /// Sets the initial sparse capacity of system member sets.
    #[must_use]
    pub fn with_initial_system_capacity(mut self, capacity: usize) -> Self {
        self.initial_system_capacity = capacity;
        self
    }

    /// Checks limits against the compile-time maxima.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_components == 0 || self.max_components > MAX_COMPONENTS {
            return Err(EcsError::InvalidConfig(format!(
                "max_components must be in 1..={MAX_COMPONENTS}, got {}",
                self.max_components
            )));
        }
        if self.max_systems == 0 || self.max_systems > MAX_SYSTEMS {
            return Err(EcsError::InvalidConfig(format!(
                "max_systems must be in 1..={MAX_SYSTEMS}, got {}",
                self.max_systems
            )));
        }
        if self.initial_entity_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "initial_entity_capacity must be non-zero".into(),
            ));
        }
        if self.initial_system_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "initial_system_capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
