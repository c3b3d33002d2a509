//! Keyboard sampling for one player's four-direction control scheme.
//!
//! Each opposing key pair is an if/else chain: up is tested before down and
//! left before right, so holding both keys of a pair resolves to up or left.

use bevy::prelude::*;

/// Per-tick interpolation factor toward the instantaneous axis target.
pub const AXIS_SMOOTHING: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlScheme {
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
}

impl ControlScheme {
    pub const WASD: ControlScheme = ControlScheme {
        up: KeyCode::KeyW,
        down: KeyCode::KeyS,
        left: KeyCode::KeyA,
        right: KeyCode::KeyD,
    };

    pub const ARROWS: ControlScheme = ControlScheme {
        up: KeyCode::ArrowUp,
        down: KeyCode::ArrowDown,
        left: KeyCode::ArrowLeft,
        right: KeyCode::ArrowRight,
    };
}

/// Bindings indexed by player slot.
pub const CONTROL_SCHEMES: [ControlScheme; 2] = [ControlScheme::WASD, ControlScheme::ARROWS];

/// Smoothed and raw axis values for one player.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisInput {
    /// Eased horizontal value in [-1, 1].
    pub horizontal: f32,
    /// Eased vertical value in [-1, 1].
    pub vertical: f32,
    /// Instantaneous horizontal target: -1, 0 or 1.
    pub horizontal_axis: i8,
    /// Instantaneous vertical target: -1, 0 or 1.
    pub vertical_axis: i8,
}

impl AxisInput {
    /// Sample the keys of `scheme` and ease both axes one tick toward them.
    pub fn sample(&mut self, scheme: &ControlScheme, is_down: impl Fn(KeyCode) -> bool) {
        self.vertical_axis = if is_down(scheme.up) {
            1
        } else if is_down(scheme.down) {
            -1
        } else {
            0
        };
        self.horizontal_axis = if is_down(scheme.left) {
            -1
        } else if is_down(scheme.right) {
            1
        } else {
            0
        };
        self.vertical = ease(self.vertical, self.vertical_axis as f32);
        self.horizontal = ease(self.horizontal, self.horizontal_axis as f32);
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.horizontal, self.vertical)
    }
}

fn ease(current: f32, target: f32) -> f32 {
    current + AXIS_SMOOTHING * (target - current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &'static [KeyCode]) -> impl Fn(KeyCode) -> bool {
        move |k| keys.contains(&k)
    }

    #[test]
    fn press_then_release_eases() {
        let mut input = AxisInput::default();
        input.sample(&ControlScheme::WASD, held(&[KeyCode::KeyW]));
        assert!((input.vertical - 0.2).abs() < 1e-6);
        assert_eq!(input.vertical_axis, 1);

        input.sample(&ControlScheme::WASD, held(&[]));
        assert!((input.vertical - 0.16).abs() < 1e-6);
        assert_eq!(input.vertical_axis, 0);
    }

    #[test]
    fn held_key_approaches_one() {
        let mut input = AxisInput::default();
        for _ in 0..60 {
            input.sample(&ControlScheme::ARROWS, held(&[KeyCode::ArrowRight]));
        }
        assert!(input.horizontal > 0.99 && input.horizontal <= 1.0);
        assert_eq!(input.horizontal_axis, 1);
    }

    #[test]
    fn up_beats_down_and_left_beats_right() {
        let mut input = AxisInput::default();
        input.sample(
            &ControlScheme::WASD,
            held(&[KeyCode::KeyW, KeyCode::KeyS, KeyCode::KeyA, KeyCode::KeyD]),
        );
        assert_eq!(input.vertical_axis, 1);
        assert_eq!(input.horizontal_axis, -1);
    }

    #[test]
    fn schemes_are_independent() {
        let mut p1 = AxisInput::default();
        let mut p2 = AxisInput::default();
        let keys = held(&[KeyCode::ArrowLeft]);
        p1.sample(&CONTROL_SCHEMES[0], &keys);
        p2.sample(&CONTROL_SCHEMES[1], &keys);
        assert_eq!(p1.horizontal_axis, 0);
        assert_eq!(p2.horizontal_axis, -1);
    }
}
