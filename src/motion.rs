//! Actor displacement, the soft world wall, and facing derivation.

use bevy::prelude::*;

use crate::components::MoveState;

/// Direction of travel scaled by how committed the input is.
///
/// The direction is the normalized axis pair; the commitment is
/// `|h| + |v|` clamped to [0, 1].
pub fn displacement(axes: Vec2, speed: f32) -> Vec2 {
    let direction = axes.normalize_or_zero();
    let commitment = (axes.x.abs() + axes.y.abs()).clamp(0.0, 1.0);
    direction * commitment * speed
}

/// Zero any component of `step` that would push an actor already past the
/// world bound further out. Position itself is never corrected.
pub fn limit_to_world(position: Vec2, step: Vec2, bound: f32) -> Vec2 {
    let limit = |pos: f32, d: f32| {
        if (pos > bound && d > 0.0) || (pos < -bound && d < 0.0) {
            0.0
        } else {
            d
        }
    };
    Vec2::new(limit(position.x, step.x), limit(position.y, step.y))
}

/// Facing for a step. Later tests overwrite earlier ones, so a diagonal
/// step shows the horizontal walk.
pub fn move_state_for(step: Vec2) -> MoveState {
    let mut state = MoveState::Watching;
    if step.y > 0.0 {
        state = MoveState::WalkingUp;
    }
    if step.y < 0.0 {
        state = MoveState::WalkingDown;
    }
    if step.x > 0.0 {
        state = MoveState::WalkingRight;
    }
    if step.x < 0.0 {
        state = MoveState::WalkingLeft;
    }
    state
}

/// Axis-aligned overlap of two boxes given centres and half extents.
pub fn boxes_overlap(a: Vec2, a_half: Vec2, b: Vec2, b_half: Vec2) -> bool {
    let d = (a - b).abs();
    d.x <= a_half.x + b_half.x && d.y <= a_half.y + b_half.y
}
