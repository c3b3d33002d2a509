//! Rabbit wandering: a periodic coin flip picks a new destination, and the
//! rabbit walks toward it until it is close enough.

use bevy::math::Vec2;
use micromegas_tracing::prelude::*;
use rand::Rng;

use super::random_point;

/// Keep the current destination, or with even odds replace it.
#[span_fn]
pub fn reroll(current: Option<Vec2>, rng: &mut impl Rng, bound: f32) -> Option<Vec2> {
    if rng.gen_bool(0.5) {
        Some(random_point(rng, bound))
    } else {
        current
    }
}

/// Step for this tick. Zero with no destination or once within
/// `arrival_radius`; the destination itself is never cleared here.
pub fn step_toward(position: Vec2, destination: Option<Vec2>, speed: f32, arrival_radius: f32) -> Vec2 {
    let Some(destination) = destination else {
        return Vec2::ZERO;
    };
    let delta = destination - position;
    if delta.length() > arrival_radius {
        delta.normalize() * speed
    } else {
        Vec2::ZERO
    }
}
