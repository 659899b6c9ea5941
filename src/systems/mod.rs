//! Engine systems.
//!
//! Submodules overview
//! - [`time`] – advance the frame clock before the schedule runs
//! - [`movement`] – move controllable entities from host-fed input intent
//! - [`collision`] – pairwise AABB overlap detection with layer filtering
//! - [`scheduler`] – evaluate due timers against the clock
//! - [`ui`] – console sink thread for UI commands
//!
//! The per-frame schedule built by [`build_frame_schedule`] runs
//! `controllable_movement -> collision_detector -> fire_due_timers` in that
//! fixed order.

use bevy_ecs::prelude::*;

pub mod collision;
pub mod movement;
pub mod scheduler;
pub mod time;
pub mod ui;

pub fn build_frame_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            movement::controllable_movement,
            collision::collision_detector,
            scheduler::fire_due_timers,
        )
            .chain(),
    );
    schedule
}
