//! Collision pair types.
//!
//! [`CollisionPair`] is the canonical form of an unordered pair: the smaller
//! id always comes first, so `(A, B)` and `(B, A)` hash and compare equal.
//! [`CollisionEventData`] is what the operation surface hands to scripts.

use serde::{Deserialize, Serialize};

use crate::components::entityid::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    pub a: EntityId,
    pub b: EntityId,
}

impl CollisionPair {
    /// Build the canonical pair regardless of argument order.
    pub fn new(x: EntityId, y: EntityId) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn involves(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }

    /// The other member of the pair, if `id` is one of them.
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// One entry of a `poll_collision_events` result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEventData {
    pub entity_a: u32,
    pub entity_b: u32,
}

impl From<CollisionPair> for CollisionEventData {
    fn from(pair: CollisionPair) -> Self {
        Self {
            entity_a: pair.a.raw(),
            entity_b: pair.b.raw(),
        }
    }
}
