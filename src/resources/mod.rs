//! ECS resources made available to systems.
//!
//! This module groups the long-lived engine state injected into the ECS world.
//!
//! Overview
//! - `registry` – public entity ids and their bevy entities
//! - `clock` – frame counter, uptime, target fps and frame-time window
//! - `scheduler` – repeating and one-shot timers bound to typed callbacks
//! - `collisionstate` – pairs overlapping in the most recent tick
//! - `collisionlayers` – which hitbox layers are tested against each other
//! - `input` – host-fed direction intent and screen bounds
//! - `engineconfig` – INI-backed configuration
//! - `ui` – text overlay handles and the optional UI sink
//! - `lua_runtime` – Lua scripting host (feature `lua`)
pub mod clock;
pub mod collisionlayers;
pub mod collisionstate;
pub mod engineconfig;
pub mod input;
#[cfg(feature = "lua")]
pub mod lua_runtime;
pub mod registry;
pub mod scheduler;
pub mod ui;
