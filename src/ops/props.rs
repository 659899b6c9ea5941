//! Component property tables as scripts send them.
//!
//! JSON requests deserialize them with serde; the Lua host reads them field by
//! field from script tables. Either way they are then validated into real
//! components. Unknown shape, input or bounds names fall back to the default
//! variant with a warning.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::components::controllable::{BoundsType, Controllable, InputType};
use crate::components::hitbox::{Hitbox, Layer};
use crate::components::render::{Color, Render, RenderShape};
use crate::error::Result;

fn default_shape() -> String {
    "square".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderProps {
    pub width: f32,
    pub height: f32,
    pub color: [f32; 3],
    #[serde(default = "default_shape")]
    pub shape: String,
}

impl RenderProps {
    pub fn into_render(self) -> Result<Render> {
        let [r, g, b] = self.color;
        let color = Color::new(r, g, b)?;
        let shape = RenderShape::from_name(&self.shape).unwrap_or_else(|| {
            warn!("unknown shape '{}', using square", self.shape);
            RenderShape::Square
        });
        Render::new(self.width, self.height, color, shape)
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxProps {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub offset_x: Option<f32>,
    #[serde(default)]
    pub offset_y: Option<f32>,
    #[serde(default)]
    pub layer: Option<Layer>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl HitboxProps {
    pub fn into_hitbox(self) -> Result<Hitbox> {
        let mut hitbox = Hitbox::with_layout(
            self.width,
            self.height,
            self.offset_x.unwrap_or(0.0),
            self.offset_y.unwrap_or(0.0),
            self.layer.unwrap_or(0),
        )?;
        hitbox.active = self.active;
        Ok(hitbox)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllableProps {
    pub movement_speed: f32,
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub bounds: String,
}

impl ControllableProps {
    pub fn into_controllable(self) -> Result<Controllable> {
        let input_type = if self.input_type.is_empty() {
            InputType::default()
        } else {
            InputType::from_name(&self.input_type).unwrap_or_else(|| {
                warn!("unknown input type '{}', using arrow keys", self.input_type);
                InputType::ArrowKeys
            })
        };
        let bounds = if self.bounds.is_empty() {
            BoundsType::default()
        } else {
            BoundsType::from_name(&self.bounds).unwrap_or_else(|| {
                warn!("unknown bounds '{}', using screen", self.bounds);
                BoundsType::Screen
            })
        };
        Controllable::new(self.movement_speed, input_type, bounds)
    }
}
