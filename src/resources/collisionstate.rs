//! Level-triggered collision results.
//!
//! [`CollisionState`] holds the pairs that overlapped in the most recent tick.
//! Polling reads this list without clearing it: every poll within one tick
//! returns the same result, and the next tick recomputes it from scratch.
//! Callers that want enter/exit edges compare consecutive polls themselves.
//!
//! Alongside the list, a per-pair "currently overlapping" map is maintained
//! for bookkeeping and debug logging only.

use bevy_ecs::prelude::Resource;
use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::components::entityid::EntityId;
use crate::events::collision::CollisionPair;

#[derive(Resource, Debug, Default)]
pub struct CollisionState {
    pairs: SmallVec<[CollisionPair; 8]>,
    overlapping: FxHashMap<CollisionPair, bool>,
}

impl CollisionState {
    /// Replace the current result with this tick's pairs (already canonical and sorted).
    pub fn publish(&mut self, pairs: SmallVec<[CollisionPair; 8]>) {
        for flag in self.overlapping.values_mut() {
            *flag = false;
        }
        for pair in &pairs {
            let was = self.overlapping.insert(*pair, true).unwrap_or(false);
            if !was {
                debug!("overlap begins: {} / {}", pair.a, pair.b);
            }
        }
        self.overlapping.retain(|pair, now| {
            if !*now {
                debug!("overlap ends: {} / {}", pair.a, pair.b);
            }
            *now
        });
        self.pairs = pairs;
    }

    pub fn pairs(&self) -> &[CollisionPair] {
        &self.pairs
    }

    pub fn is_overlapping(&self, a: EntityId, b: EntityId) -> bool {
        self.overlapping
            .get(&CollisionPair::new(a, b))
            .copied()
            .unwrap_or(false)
    }

    /// Drop every pair that references `id`, including this tick's published list.
    pub fn forget(&mut self, id: EntityId) {
        self.pairs.retain(|p| !p.involves(id));
        self.overlapping.retain(|p, _| !p.involves(id));
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.overlapping.clear();
    }
}
