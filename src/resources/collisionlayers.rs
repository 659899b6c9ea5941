//! Layer interaction matrix for the pair scan.
//!
//! Every pair of layers interacts unless configured otherwise. Overrides are
//! symmetric: allowing or denying `(a, b)` also covers `(b, a)`.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::components::hitbox::Layer;

#[derive(Resource, Debug, Clone)]
pub struct CollisionLayers {
    default_interact: bool,
    overrides: FxHashMap<(Layer, Layer), bool>,
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::new(true)
    }
}

fn key(a: Layer, b: Layer) -> (Layer, Layer) {
    if a <= b { (a, b) } else { (b, a) }
}

impl CollisionLayers {
    pub fn new(default_interact: bool) -> Self {
        Self {
            default_interact,
            overrides: FxHashMap::default(),
        }
    }

    pub fn set(&mut self, a: Layer, b: Layer, interact: bool) {
        self.overrides.insert(key(a, b), interact);
    }

    pub fn allow(&mut self, a: Layer, b: Layer) {
        self.set(a, b, true);
    }

    pub fn deny(&mut self, a: Layer, b: Layer) {
        self.set(a, b, false);
    }

    pub fn interacts(&self, a: Layer, b: Layer) -> bool {
        self.overrides
            .get(&key(a, b))
            .copied()
            .unwrap_or(self.default_interact)
    }

    pub fn default_interact(&self) -> bool {
        self.default_interact
    }
}
