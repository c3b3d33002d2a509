pub mod ai;
pub mod app_state;
pub mod components;
pub mod config;
pub mod events;
pub mod input;
pub mod motion;
pub mod plugins;
pub mod resources;
pub mod scoring;
pub mod tracing_bridge;
pub mod transition;

use bevy::prelude::*;
use bevy_kira_audio::AudioPlugin;

use app_state::GameState;
use config::{CONFIG_PATH, GameConfig};
use plugins::audio::GameAudioPlugin;
use plugins::camera::CameraPlugin;
use plugins::environment::EnvironmentPlugin;
use plugins::game_over::GameOverPlugin;
use plugins::hud::HudPlugin;
use plugins::menu::MenuPlugin;
use plugins::npc::NpcPlugin;
use plugins::player::PlayerPlugin;
use plugins::scene_flow::SceneFlowPlugin;
use plugins::sprites::SpriteAnimationPlugin;
use plugins::telemetry::TelemetryPlugin;

pub struct RabbitHuntPlugin;

impl Plugin for RabbitHuntPlugin {
    fn build(&self, app: &mut App) {
        // State machine (StatesPlugin comes from DefaultPlugins). Only the
        // scene director moves it.
        app.init_state::<GameState>();
        app.insert_resource(GameConfig::load_or_default(CONFIG_PATH));

        // Audio
        app.add_plugins(AudioPlugin);
        app.add_plugins(GameAudioPlugin);

        // Scene flow first: it configures the gameplay sets the rest use.
        app.add_plugins(SceneFlowPlugin);
        app.add_plugins(MenuPlugin);
        app.add_plugins(EnvironmentPlugin);
        app.add_plugins(GameOverPlugin);

        // Gameplay
        app.add_plugins(PlayerPlugin);
        app.add_plugins(NpcPlugin);
        app.add_plugins(SpriteAnimationPlugin);
        app.add_plugins(CameraPlugin);
        app.add_plugins(HudPlugin);
        app.add_plugins(TelemetryPlugin);
    }
}
