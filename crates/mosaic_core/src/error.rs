//! # ECS Error Types
//!
//! Usage errors the world rejects before mutating anything. A system's
//! non-zero update code is not an error: it is returned as `Ok(code)`.

use thiserror::Error;

use crate::ecs::{ComponentId, EntityId, SystemId};

/// Errors that can occur while operating a [`World`](crate::World).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// More component types registered than the world allows.
    #[error("component capacity exceeded: at most {max} component types")]
    ComponentCapacityExceeded {
        /// Configured maximum.
        max: usize,
    },

    /// More systems registered than the world allows.
    #[error("system capacity exceeded: at most {max} systems")]
    SystemCapacityExceeded {
        /// Configured maximum.
        max: usize,
    },

    /// Component handle was not issued by this world.
    #[error("invalid component handle: {0}")]
    InvalidComponent(ComponentId),

    /// System handle was not issued by this world.
    #[error("invalid system handle: {0}")]
    InvalidSystem(SystemId),

    /// Entity does not exist or was destroyed.
    #[error("entity {0} does not exist")]
    InvalidEntity(EntityId),

    /// Entity is queued for destruction.
    #[error("entity {0} is queued for destruction")]
    EntityNotReady(EntityId),

    /// Entity does not carry the component.
    #[error("entity {entity} has no component {component}")]
    ComponentNotAttached {
        /// The entity.
        entity: EntityId,
        /// The missing component.
        component: ComponentId,
    },

    /// Entity already carries the component.
    #[error("entity {entity} already has component {component}")]
    ComponentAlreadyAttached {
        /// The entity.
        entity: EntityId,
        /// The duplicate component.
        component: ComponentId,
    },

    /// Typed access with a Rust type other than the registered one.
    #[error("component {component} is {registered}, not {requested}")]
    ComponentTypeMismatch {
        /// The component handle.
        component: ComponentId,
        /// Type name the component was registered with.
        registered: &'static str,
        /// Type name used for the access.
        requested: &'static str,
    },

    /// Component alignment exceeds what the byte storage guarantees.
    #[error("component {name} needs alignment {align}, storage provides {max}")]
    UnsupportedAlignment {
        /// Type name of the component.
        name: &'static str,
        /// Required alignment.
        align: usize,
        /// Largest supported alignment.
        max: usize,
    },

    /// Every `u32` entity id has been issued.
    #[error("entity ids exhausted")]
    EntityIdsExhausted,

    /// System is already running further up the call stack.
    #[error("system {0} is already running")]
    SystemBusy(SystemId),

    /// Invalid world configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
