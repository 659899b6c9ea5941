//! Stable, never-reused entity identifiers.
//!
//! bevy recycles entity indices behind a generation counter. Scripts hold on
//! to ids across frames without existence checks, so the engine hands out its
//! own monotonically increasing [`EntityId`] instead and keeps the mapping in
//! [`EntityRegistry`](crate::resources::registry::EntityRegistry).

use std::fmt;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// Public identifier of an entity. `0` is never allocated.
#[derive(
    Component, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const INVALID: EntityId = EntityId(0);

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(raw: u32) -> Self {
        EntityId(raw)
    }
}
