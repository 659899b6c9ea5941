use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// World-space position (the entity pivot). Hitboxes and renders are centered on it.
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Validated constructor. Both coordinates must be finite.
    pub fn new(x: f32, y: f32) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(EngineError::invalid(
                "position",
                format!("coordinates must be finite, got ({x}, {y})"),
            ));
        }
        Ok(Self { x, y })
    }
}
