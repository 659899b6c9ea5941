//! Frameloom library.
//!
//! A frame-stepped 2D simulation engine: entities with position, render,
//! hitbox and controllable components, level-triggered AABB collision
//! polling, fixed-phase repeating timers and a frame clock, all driven
//! through a synchronous operation surface by scripts or Rust hosts.
//!
//! - [`engine`] – the [`Engine`](engine::Engine) session and frame loop
//! - [`ops`] – soft-failure operation surface and its JSON request form
//! - [`components`], [`resources`], [`systems`], [`events`] – the ECS parts
//! - [`game`] – the built-in square demo

pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod ops;
pub mod resources;
pub mod systems;

pub use engine::Engine;
pub use error::{EngineError, Result};
