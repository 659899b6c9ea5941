//! Direction intent fed by the host, and the screen rectangle used for clamping.
//!
//! Translating physical keys into intent is the host's job. The engine only
//! sees which directions are held for each [`InputType`] scheme.
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::controllable::InputType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Held directions for one control scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionSet {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionSet {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    /// Unit-less axis values in `{-1, 0, 1}`; y grows downward.
    pub fn axis(&self) -> (f32, f32) {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.down as i8 - self.up as i8) as f32;
        (x, y)
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    pub arrows: DirectionSet,
    pub wasd: DirectionSet,
}

impl InputState {
    pub fn scheme(&self, input_type: InputType) -> &DirectionSet {
        match input_type {
            InputType::ArrowKeys => &self.arrows,
            InputType::Wasd => &self.wasd,
        }
    }

    pub fn set(&mut self, input_type: InputType, direction: Direction, pressed: bool) {
        match input_type {
            InputType::ArrowKeys => self.arrows.set(direction, pressed),
            InputType::Wasd => self.wasd.set(direction, pressed),
        }
    }

    pub fn release_all(&mut self) {
        *self = InputState::default();
    }
}

/// Screen rectangle `[0, w] x [0, h]` used by `BoundsType::Screen`.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct ScreenBounds {
    pub w: f32,
    pub h: f32,
}

impl Default for ScreenBounds {
    fn default() -> Self {
        Self { w: 800.0, h: 600.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_cancels_opposites() {
        let mut set = DirectionSet::default();
        set.set(Direction::Left, true);
        set.set(Direction::Right, true);
        set.set(Direction::Up, true);
        assert_eq!(set.axis(), (0.0, -1.0));
    }

    #[test]
    fn test_schemes_are_independent() {
        let mut input = InputState::default();
        input.set(InputType::Wasd, Direction::Down, true);
        assert_eq!(input.scheme(InputType::Wasd).axis(), (0.0, 1.0));
        assert_eq!(input.scheme(InputType::ArrowKeys).axis(), (0.0, 0.0));
    }
}
