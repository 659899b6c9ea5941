//! Input-driven movement for controllable entities.
//!
//! Reads the host-fed [`InputState`] and moves every entity carrying a
//! [`Controllable`] and a [`Position`]. Diagonal movement is normalized to
//! keep a constant speed. Entities bound to the screen are clamped to
//! [`ScreenBounds`].
use std::f32::consts::FRAC_1_SQRT_2;

use bevy_ecs::prelude::*;

use crate::components::controllable::{BoundsType, Controllable};
use crate::components::position::Position;
use crate::resources::clock::Clock;
use crate::resources::input::{InputState, ScreenBounds};

pub fn controllable_movement(
    mut query: Query<(&Controllable, &mut Position)>,
    input_state: Res<InputState>,
    clock: Res<Clock>,
    bounds: Res<ScreenBounds>,
) {
    let dt = clock.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (controllable, mut position) in query.iter_mut() {
        let (mut dx, mut dy) = input_state.scheme(controllable.input_type).axis();
        if dx == 0.0 && dy == 0.0 {
            continue;
        }
        if dx != 0.0 && dy != 0.0 {
            dx *= FRAC_1_SQRT_2;
            dy *= FRAC_1_SQRT_2;
        }

        let step = controllable.movement_speed * dt;
        let mut x = position.x + dx * step;
        let mut y = position.y + dy * step;

        if controllable.bounds == BoundsType::Screen {
            x = x.clamp(0.0, bounds.w);
            y = y.clamp(0.0, bounds.h);
        }

        position.x = x;
        position.y = y;
    }
}
