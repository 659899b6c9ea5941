//! Pairwise AABB overlap detection.
//!
//! Every tick, [`collision_detector`] scans all entity pairs that carry an
//! active [`Hitbox`] and publishes the overlapping ones to
//! [`CollisionState`]. Pairs whose layers do not interact are skipped before
//! any rectangle math. Touching edges are not an overlap.
use bevy_ecs::prelude::*;
use smallvec::SmallVec;

use crate::components::entityid::EntityId;
use crate::components::hitbox::Hitbox;
use crate::components::position::Position;
use crate::events::collision::CollisionPair;
use crate::resources::collisionlayers::CollisionLayers;
use crate::resources::collisionstate::CollisionState;

pub fn collision_detector(
    query: Query<(&EntityId, &Position, &Hitbox)>,
    layers: Res<CollisionLayers>,
    mut state: ResMut<CollisionState>,
) {
    let mut bodies: Vec<(EntityId, &Position, &Hitbox)> = query
        .iter()
        .filter(|(_, _, hitbox)| hitbox.active)
        .map(|(id, position, hitbox)| (*id, position, hitbox))
        .collect();
    // Sorting by id makes every pair come out canonical and in order.
    bodies.sort_unstable_by_key(|(id, _, _)| *id);

    let mut pairs: SmallVec<[CollisionPair; 8]> = SmallVec::new();
    for (i, (id_a, position_a, hitbox_a)) in bodies.iter().enumerate() {
        for (id_b, position_b, hitbox_b) in &bodies[i + 1..] {
            if !layers.interacts(hitbox_a.layer, hitbox_b.layer) {
                continue;
            }
            if hitbox_a.overlaps(position_a, hitbox_b, position_b) {
                pairs.push(CollisionPair::new(*id_a, *id_b));
            }
        }
    }

    state.publish(pairs);
}
