//! Player actors: keyboard sampling, movement inside the world wall, and
//! facing.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::GameSet;
use crate::components::{Hitbox, MoveSpeed, MoveState, Player, Velocity};
use crate::config::GameConfig;
use crate::events::Footstep;
use crate::input::{AxisInput, CONTROL_SCHEMES};
use crate::motion::{displacement, limit_to_world, move_state_for};
use crate::plugins::sprites::{AnimationSet, animated_bundle};

/// Sprite size of a player in world units.
pub const PLAYER_SIZE: Vec2 = Vec2::new(1.5, 1.5);

/// Half extents used for rabbit pickup.
pub const PLAYER_HITBOX: Vec2 = Vec2::new(0.5, 0.5);

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, sample_input.in_set(GameSet::Input));
        app.add_systems(Update, move_players.in_set(GameSet::Motion));
        app.add_systems(Update, face_players.in_set(GameSet::Animation));
    }
}

pub fn player_bundle(
    slot: usize,
    position: Vec2,
    speed: f32,
    animations: AnimationSet,
) -> impl Bundle {
    (
        Player { slot },
        AxisInput::default(),
        MoveSpeed(speed),
        Velocity::default(),
        MoveState::default(),
        Hitbox(PLAYER_HITBOX),
        animated_bundle(animations, PLAYER_SIZE),
        Transform::from_xyz(position.x, position.y, 10.0),
    )
}

/// Sample each player's control scheme into its eased axes.
#[span_fn]
fn sample_input(keyboard: Res<ButtonInput<KeyCode>>, mut players: Query<(&Player, &mut AxisInput)>) {
    for (player, mut axes) in &mut players {
        let Some(scheme) = CONTROL_SCHEMES.get(player.slot) else {
            continue;
        };
        axes.sample(scheme, |key| keyboard.pressed(key));
    }
}

/// Apply this tick's displacement. Velocity keeps the step from before the
/// world wall so facing still reflects what the player asked for.
#[span_fn]
fn move_players(
    mut commands: Commands,
    config: Option<Res<GameConfig>>,
    mut players: Query<(&Player, &AxisInput, &MoveSpeed, &mut Velocity, &mut Transform)>,
) {
    let bound = config.map(|c| c.world_bound).unwrap_or(16.0);
    for (player, axes, speed, mut velocity, mut transform) in &mut players {
        let step = displacement(axes.as_vec2(), speed.0);
        velocity.0 = step;
        let position = transform.translation.truncate();
        let limited = limit_to_world(position, step, bound);
        transform.translation.x += limited.x;
        transform.translation.y += limited.y;
        if step != Vec2::ZERO {
            commands.trigger(Footstep { slot: player.slot });
        }
    }
}

#[span_fn]
fn face_players(mut players: Query<(&Velocity, &mut MoveState), With<Player>>) {
    for (velocity, mut state) in &mut players {
        state.set_if_neq(move_state_for(velocity.0));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
