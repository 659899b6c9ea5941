//! Marks an entity as movable by host-fed input.
//!
//! The [`controllable_movement`](crate::systems::movement::controllable_movement)
//! system reads [`InputState`](crate::resources::input::InputState) and moves
//! every entity that carries a [`Controllable`] and a
//! [`Position`](crate::components::position::Position). Scripts remove the
//! component to freeze a player (on a win) and add it back on reset.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Which direction set drives the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    ArrowKeys,
    Wasd,
}

impl InputType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "arrow_keys" | "arrows" => Some(InputType::ArrowKeys),
            "wasd" => Some(InputType::Wasd),
            _ => None,
        }
    }
}

/// Movement clamp applied after each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsType {
    /// Keep the position inside [`ScreenBounds`](crate::resources::input::ScreenBounds).
    #[default]
    Screen,
    None,
}

impl BoundsType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "screen" => Some(BoundsType::Screen),
            "none" => Some(BoundsType::None),
            _ => None,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Controllable {
    /// Pixels per second.
    pub movement_speed: f32,
    pub input_type: InputType,
    pub bounds: BoundsType,
}

impl Controllable {
    pub fn new(movement_speed: f32, input_type: InputType, bounds: BoundsType) -> Result<Self> {
        if !movement_speed.is_finite() || movement_speed < 0.0 {
            return Err(EngineError::invalid(
                "controllable",
                format!("movement_speed must be finite and non-negative, got {movement_speed}"),
            ));
        }
        Ok(Self {
            movement_speed,
            input_type,
            bounds,
        })
    }
}
