//! Engine error taxonomy.
//!
//! Every variant is recoverable. The operation surface in [`crate::ops`]
//! turns these into soft failures (`false`, `None`, or a no-op) and logs them,
//! so a bad call from a script never stops the frame loop.

use thiserror::Error;

use crate::components::entityid::EntityId;
use crate::resources::scheduler::TimerId;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The id was never allocated or the entity has been destroyed.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// Rejected at the boundary before anything was stored.
    #[error("invalid {component} data: {reason}")]
    InvalidComponentData {
        component: &'static str,
        reason: String,
    },

    #[error("unknown or inactive timer {0}")]
    UnknownTimer(TimerId),

    #[error("no callback registered under '{0}'")]
    UnknownCallback(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),
}

impl EngineError {
    pub(crate) fn invalid(component: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidComponentData {
            component,
            reason: reason.into(),
        }
    }
}
