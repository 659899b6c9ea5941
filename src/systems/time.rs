//! Clock update.
//!
//! Advances the shared [`Clock`](crate::resources::clock::Clock) resource once
//! per frame, before the frame schedule runs.
use std::time::Duration;

use bevy_ecs::prelude::*;

use crate::resources::clock::Clock;

/// Record one frame of `dt` on the `Clock` resource.
pub fn advance_clock(world: &mut World, dt: Duration) {
    world.resource_mut::<Clock>().advance(dt);
}
