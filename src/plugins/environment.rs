//! The forest: ground, scattered dressing, rabbits, players with their
//! cameras, and the HUD, built as one gameplay scene.

use bevy::prelude::*;
use micromegas_tracing::prelude::info;
use rand::Rng;

use crate::ai::random_point;
use crate::app_state::GameState;
use crate::components::Dressing;
use crate::config::GameConfig;
use crate::plugins::camera::{follow_camera, ui_camera};
use crate::plugins::hud::spawn_hud;
use crate::plugins::npc::rabbit_bundle;
use crate::plugins::player::player_bundle;
use crate::plugins::scene_flow::{SceneAppExt, SceneBuilder, StateScene};
use crate::plugins::sprites::{
    AnimationSet, PLAYER_WALKING, PLAYER_WATCHING, RABBIT_WALKING, RABBIT_WATCHING,
};
use crate::scoring::ScoreTracker;

const GROUND: Color = Color::srgb(0.28, 0.48, 0.22);

/// Strip prefix of the rabbit animations.
pub const RABBIT_STRIPS: &str = "sprites/animals/rabbit";

/// Scattered props: file stem, count, sprite size in world units.
pub const DRESSING: [(&str, usize, Vec2); 4] = [
    ("tree", 20, Vec2::new(3.0, 3.0)),
    ("grass", 10, Vec2::new(1.0, 1.0)),
    ("rock", 10, Vec2::new(1.2, 1.2)),
    ("statue", 5, Vec2::new(2.0, 2.0)),
];

pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.register_scene(GameState::GameSolo, ForestScene)
            .register_scene(GameState::GameMulti, ForestScene);
    }
}

/// Strip prefix of the character played from `slot`.
pub fn player_strips(slot: usize) -> String {
    format!("sprites/character/spearman{}", slot + 1)
}

pub fn dressing_path(stem: &str) -> String {
    format!("textures/environment/{}.png", stem)
}

/// Where the player in `slot` starts.
pub fn player_start(slot: usize, players: usize) -> Vec2 {
    if players < 2 {
        Vec2::ZERO
    } else {
        Vec2::new(slot as f32 * 4.0 - 2.0, 0.0)
    }
}

struct ForestScene;

impl StateScene for ForestScene {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        let players = match scene.target() {
            GameState::GameSolo => 1,
            GameState::GameMulti => 2,
            other => return Err(format!("{:?} is not a gameplay state", other)),
        };
        let config = scene
            .world()
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();
        let bound = config.world_bound;
        let mut rng = rand::thread_rng();

        spawn_ground(scene, bound);
        spawn_dressing(scene, &mut rng, bound);

        let rabbit = AnimationSet::load(
            scene,
            RABBIT_STRIPS,
            RABBIT_WATCHING,
            RABBIT_WALKING,
        );
        for _ in 0..config.rabbit_count {
            let at = random_point(&mut rng, bound);
            scene.spawn(rabbit_bundle(at, &config, rabbit.clone()));
        }

        for slot in 0..players {
            let start = player_start(slot, players);
            let animations = AnimationSet::load(
                scene,
                &player_strips(slot),
                PLAYER_WATCHING,
                PLAYER_WALKING,
            );
            scene.spawn(player_bundle(slot, start, config.player_speed, animations));
            scene.spawn(follow_camera(slot, start));
        }

        let ui = scene.spawn(ui_camera()).id();
        spawn_hud(
            scene,
            ui,
            &ScoreTracker::new(config.session_secs, config.collect_target),
        );

        info!(
            "built forest for {} player(s) with {} rabbits",
            players, config.rabbit_count
        );
        Ok(())
    }
}

fn spawn_ground(scene: &mut SceneBuilder, bound: f32) {
    scene.spawn((
        Dressing,
        Sprite {
            color: GROUND,
            custom_size: Some(Vec2::splat(bound * 2.0 + 8.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 0.0),
    ));
}

fn spawn_dressing(scene: &mut SceneBuilder, rng: &mut impl Rng, bound: f32) {
    for (stem, count, size) in DRESSING {
        let image = scene.load::<Image>(&dressing_path(stem));
        for _ in 0..count {
            let at = random_point(rng, bound);
            scene.spawn((
                Dressing,
                Sprite {
                    image: image.clone(),
                    custom_size: Some(size),
                    ..default()
                },
                Transform::from_xyz(at.x, at.y, 1.0),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
