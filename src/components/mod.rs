//! ECS components for entities.
//!
//! Every entity created through the engine carries an [`entityid::EntityId`].
//! The remaining components are optional and attached at runtime.
//!
//! Submodules overview:
//! - [`entityid`] – stable, never-reused public id of an entity
//! - [`position`] – world-space position
//! - [`render`] – presentational size, color and shape
//! - [`hitbox`] – axis-aligned collision rectangle with a layer filter
//! - [`controllable`] – marks an entity as movable by host input

pub mod controllable;
pub mod entityid;
pub mod hitbox;
pub mod position;
pub mod render;
