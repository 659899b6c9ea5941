//! Entity id allocation.
//!
//! [`EntityRegistry`] hands out [`EntityId`]s from a monotonic counter and maps
//! them to the bevy [`Entity`] that stores the components. Destroyed ids are
//! dropped from the map and never handed out again, so a stale id held by a
//! script resolves to "unknown entity" rather than aliasing a newer entity.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::entityid::EntityId;

#[derive(Resource, Debug)]
pub struct EntityRegistry {
    /// `None` once `u32::MAX` has been issued.
    next_id: Option<u32>,
    live: FxHashMap<EntityId, Entity>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self {
            next_id: Some(1),
            live: FxHashMap::default(),
        }
    }
}

impl EntityRegistry {
    /// Reserve the next id. The caller spawns the bevy entity and calls [`bind`](Self::bind).
    ///
    /// Returns `None` once every id up to and including `u32::MAX` has been issued.
    pub fn allocate(&mut self) -> Option<EntityId> {
        let id = self.next_id?;
        self.next_id = id.checked_add(1);
        Some(EntityId(id))
    }

    pub fn bind(&mut self, id: EntityId, entity: Entity) {
        self.live.insert(id, entity);
    }

    pub fn resolve(&self, id: EntityId) -> Option<Entity> {
        self.live.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    /// Forget a live id. Returns the bevy entity that backed it.
    pub fn release(&mut self, id: EntityId) -> Option<Entity> {
        self.live.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.live.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
