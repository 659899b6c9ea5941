//! Axis-aligned collision box.
//!
//! A [`Hitbox`] is centered on the entity's [`Position`] plus its offset:
//! the world rectangle spans `center ± size / 2` on each axis.

use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::components::position::Position;
use crate::error::{EngineError, Result};

/// Collision layer used by [`CollisionLayers`](crate::resources::collisionlayers::CollisionLayers).
pub type Layer = u32;

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Hitbox {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub layer: Layer,
    /// Inactive hitboxes are skipped by the pair scan.
    pub active: bool,
}

/// World-space rectangle, `min` inclusive and `max` exclusive for overlap purposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    /// Strict interval intersection on both axes. Rectangles whose edges only
    /// touch do not overlap, and a zero-area rectangle overlaps nothing.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !self.is_degenerate()
            && !other.is_degenerate()
            && self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    pub fn is_degenerate(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }
}

impl Hitbox {
    /// Create a centered hitbox on layer 0 with no offset.
    pub fn new(width: f32, height: f32) -> Result<Self> {
        Self::with_layout(width, height, 0.0, 0.0, 0)
    }

    /// Create a hitbox, validating every field.
    pub fn with_layout(
        width: f32,
        height: f32,
        offset_x: f32,
        offset_y: f32,
        layer: Layer,
    ) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(EngineError::invalid(
                "hitbox",
                format!("size must be finite and non-negative, got {width}x{height}"),
            ));
        }
        if !(offset_x.is_finite() && offset_y.is_finite()) {
            return Err(EngineError::invalid(
                "hitbox",
                format!("offset must be finite, got ({offset_x}, {offset_y})"),
            ));
        }
        Ok(Self {
            width,
            height,
            offset_x,
            offset_y,
            layer,
            active: true,
        })
    }

    /// World rectangle for the given entity position.
    pub fn aabb(&self, position: &Position) -> Aabb {
        let cx = position.x + self.offset_x;
        let cy = position.y + self.offset_y;
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        Aabb {
            min_x: cx - hw,
            min_y: cy - hh,
            max_x: cx + hw,
            max_y: cy + hh,
        }
    }

    /// AABB vs AABB overlap test against another hitbox at a different entity position.
    pub fn overlaps(&self, position: &Position, other: &Self, other_position: &Position) -> bool {
        self.aabb(position).overlaps(&other.aabb(other_position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f32, y: f32) -> Position {
        Position { x, y }
    }

    #[test]
    fn test_aabb_is_centered_with_offset() {
        let hb = Hitbox::with_layout(20.0, 10.0, 5.0, -5.0, 0).unwrap();
        let aabb = hb.aabb(&pos(100.0, 100.0));
        assert_eq!(aabb.min_x, 95.0);
        assert_eq!(aabb.max_x, 115.0);
        assert_eq!(aabb.min_y, 90.0);
        assert_eq!(aabb.max_y, 100.0);
    }

    #[test]
    fn test_disjoint_boxes_do_not_overlap() {
        let hb = Hitbox::new(20.0, 20.0).unwrap();
        assert!(!hb.overlaps(&pos(100.0, 300.0), &hb, &pos(400.0, 300.0)));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let hb = Hitbox::new(20.0, 20.0).unwrap();
        // [90, 110] and [110, 130] share only the x = 110 edge
        assert!(!hb.overlaps(&pos(100.0, 100.0), &hb, &pos(120.0, 100.0)));
        assert!(!hb.overlaps(&pos(100.0, 100.0), &hb, &pos(100.0, 120.0)));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Hitbox::new(20.0, 20.0).unwrap();
        let b = Hitbox::new(10.0, 10.0).unwrap();
        let pa = pos(0.0, 0.0);
        let pb = pos(12.0, 3.0);
        assert!(a.overlaps(&pa, &b, &pb));
        assert!(b.overlaps(&pb, &a, &pa));
    }

    #[test]
    fn test_zero_size_never_overlaps() {
        let point = Hitbox::new(0.0, 0.0).unwrap();
        let big = Hitbox::new(50.0, 50.0).unwrap();
        assert!(!point.overlaps(&pos(0.0, 0.0), &big, &pos(0.0, 0.0)));
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        assert!(Hitbox::new(-1.0, 1.0).is_err());
        assert!(Hitbox::new(1.0, f32::NAN).is_err());
        assert!(Hitbox::with_layout(1.0, 1.0, f32::INFINITY, 0.0, 0).is_err());
    }
}
