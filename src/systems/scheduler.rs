//! Timer due check.
//!
//! Runs after collision detection so that callbacks dispatched for this tick
//! observe this tick's overlap results.
use bevy_ecs::prelude::*;

use crate::resources::clock::Clock;
use crate::resources::scheduler::EventScheduler;

pub fn fire_due_timers(clock: Res<Clock>, mut scheduler: ResMut<EventScheduler>) {
    scheduler.collect_due(clock.uptime_ms());
}
