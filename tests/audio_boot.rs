use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy_kira_audio::prelude::*;

use rabbit_hunt::app_state::GameState;
use rabbit_hunt::plugins::audio::{AudioLoadState, GameAudioPlugin, MusicChannel, SfxChannel};
use rabbit_hunt::plugins::menu::MenuPlugin;
use rabbit_hunt::plugins::scene_flow::{HoldBoot, SceneFlowPlugin};

fn audio_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(AssetPlugin::default());
    app.add_plugins(StatesPlugin);
    app.add_plugins(AudioPlugin);
    app.init_state::<GameState>();
    app.init_resource::<ButtonInput<KeyCode>>();
    app.add_plugins(GameAudioPlugin);
    app.add_plugins(SceneFlowPlugin);
    app.add_plugins(MenuPlugin);
    app.finish();
    app.cleanup();
    app
}

// ---------------------------------------------------------------------------
// Test 1: the game audio plugin initializes headless
// ---------------------------------------------------------------------------

#[test]
fn game_audio_initializes_headless() {
    let mut app = audio_app();
    for _ in 0..3 {
        app.update();
    }
    assert!(app.world().get_resource::<AudioChannel<MusicChannel>>().is_some());
    assert!(app.world().get_resource::<AudioChannel<SfxChannel>>().is_some());
}

// ---------------------------------------------------------------------------
// Test 2: the boot screen is held until the audio collection settles, and
// is released whether it loads or fails
// ---------------------------------------------------------------------------

#[test]
fn boot_is_released_once_audio_settles() {
    let mut app = audio_app();
    app.update();
    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::Loading
    );

    // Asset IO runs on the task pools; give it a bounded number of frames.
    let mut settled = false;
    for _ in 0..500 {
        app.update();
        let audio = *app.world().resource::<State<AudioLoadState>>().get();
        let game = *app.world().resource::<State<GameState>>().get();
        if audio != AudioLoadState::Loading && game == GameState::Start {
            settled = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(settled, "boot screen never released");
    assert!(app.world().get_resource::<HoldBoot>().is_none());
}
