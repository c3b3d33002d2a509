//! Autonomous actor behaviours.

pub mod wander;

use bevy::math::Vec2;
use rand::Rng;

/// Uniform point inside the square world `[-bound, bound]²`.
pub fn random_point(rng: &mut impl Rng, bound: f32) -> Vec2 {
    Vec2::new(rng.gen_range(-bound..=bound), rng.gen_range(-bound..=bound))
}
