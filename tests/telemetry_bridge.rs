use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use micromegas_tracing::prelude::{imetric, info};
use serial_test::serial;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

use rabbit_hunt::app_state::GameState;
use rabbit_hunt::config::GameConfig;
use rabbit_hunt::plugins::environment::EnvironmentPlugin;
use rabbit_hunt::plugins::hud::HudPlugin;
use rabbit_hunt::plugins::menu::MenuPlugin;
use rabbit_hunt::plugins::scene_flow::{SceneDirector, SceneFlowPlugin, SceneRequest};
use rabbit_hunt::plugins::telemetry::TelemetryPlugin;
use rabbit_hunt::tracing_bridge::MicromegasBridgeLayer;

fn bridged_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.init_state::<GameState>();
    app.init_resource::<ButtonInput<KeyCode>>();
    app.insert_resource(GameConfig {
        rabbit_count: 0,
        ..GameConfig::default()
    });
    app.add_plugins(SceneFlowPlugin);
    app.add_plugins(MenuPlugin);
    app.add_plugins(EnvironmentPlugin);
    app.add_plugins(HudPlugin);
    app.add_plugins(TelemetryPlugin);
    app
}

// ---------------------------------------------------------------------------
// Test 1: scene transitions and frame telemetry run under the bridge layer
// without a Micromegas sink installed
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn transitions_run_under_the_bridge() {
    let subscriber = Registry::default().with(MicromegasBridgeLayer);
    tracing::subscriber::with_default(subscriber, || {
        let mut app = bridged_app();
        app.update();
        for target in [GameState::MainMenu, GameState::SoloMenu] {
            app.world_mut()
                .resource_mut::<SceneDirector>()
                .request(SceneRequest::Goto(target));
            app.update();
        }
        app.world_mut()
            .resource_mut::<SceneDirector>()
            .request(SceneRequest::StartGame);
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(
            *app.world().resource::<State<GameState>>().get(),
            GameState::GameSolo
        );
    });
}

// ---------------------------------------------------------------------------
// Test 2: spans entered on worker threads are dropped silently
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn bridge_tolerates_uninitialized_threads() {
    let subscriber = Registry::default().with(MicromegasBridgeLayer);
    let dispatch = tracing::Dispatch::new(subscriber);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dispatch = dispatch.clone();
            std::thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    let _span =
                        tracing::info_span!("scene_transition", name = ?GameState::Win).entered();
                    let _schedule = tracing::info_span!("schedule", name = "Update").entered();
                    info!("thread {} inside bridged spans", i);
                    imetric!("bridge_thread_tick", "count", 1);
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
