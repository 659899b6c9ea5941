//! Presentational data for an entity.
//!
//! [`Render`] is never read by collision math. The engine only stores it and
//! lets scripts recolor it; drawing is left to whatever host consumes it.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// RGB color with each channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0 };
    pub const GREEN: Color = Color { r: 0.0, g: 1.0, b: 0.0 };
    pub const YELLOW: Color = Color { r: 1.0, g: 1.0, b: 0.0 };

    /// Builds a color, rejecting non-finite channels and clamping the rest into `[0, 1]`.
    pub fn new(r: f32, g: f32, b: f32) -> Result<Self> {
        if !(r.is_finite() && g.is_finite() && b.is_finite()) {
            return Err(EngineError::invalid(
                "color",
                format!("channels must be finite, got ({r}, {g}, {b})"),
            ));
        }
        Ok(Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        })
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderShape {
    #[default]
    Square,
    Circle,
}

impl RenderShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "square" => Some(RenderShape::Square),
            "circle" => Some(RenderShape::Circle),
            _ => None,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Render {
    pub width: f32,
    pub height: f32,
    pub color: Color,
    pub shape: RenderShape,
}

impl Render {
    pub fn new(width: f32, height: f32, color: Color, shape: RenderShape) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(EngineError::invalid(
                "render",
                format!("size must be finite and non-negative, got {width}x{height}"),
            ));
        }
        Ok(Self {
            width,
            height,
            color,
            shape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_clamps_channels() {
        let c = Color::new(1.5, -0.2, 0.5).unwrap();
        assert_eq!(c.to_array(), [1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_color_rejects_nan() {
        assert!(Color::new(f32::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_render_rejects_negative_size() {
        assert!(Render::new(-1.0, 10.0, Color::WHITE, RenderShape::Square).is_err());
        assert!(Render::new(0.0, 0.0, Color::WHITE, RenderShape::Circle).is_ok());
    }

    #[test]
    fn test_shape_from_name() {
        assert_eq!(RenderShape::from_name("Circle"), Some(RenderShape::Circle));
        assert_eq!(RenderShape::from_name("outline"), None);
    }
}
