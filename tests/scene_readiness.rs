use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::image::ImagePlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use rabbit_hunt::app_state::GameState;
use rabbit_hunt::components::{ActiveScene, Player, SceneOwned, SceneRoot, SceneWaits};
use rabbit_hunt::config::GameConfig;
use rabbit_hunt::plugins::environment::EnvironmentPlugin;
use rabbit_hunt::plugins::scene_flow::{
    SceneAppExt, SceneBuilder, SceneDirector, SceneFlowPlugin, SceneRequest, StateScene,
};

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// Scene with nothing to wait for.
struct Plain;

impl StateScene for Plain {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        scene.spawn(Node::default());
        Ok(())
    }
}

/// Scene whose only texture is not on disk.
struct MissingTexture;

impl StateScene for MissingTexture {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        let image = scene.load::<Image>("textures/not_shipped.png");
        scene.spawn(ImageNode::new(image));
        Ok(())
    }
}

/// Scene waiting on a handle nothing will ever load.
struct Stalled;

impl StateScene for Stalled {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        let handle = scene
            .world_mut()
            .resource_mut::<Assets<Image>>()
            .reserve_handle();
        scene.await_asset(handle);
        scene.spawn(Node::default());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Headless app with a real asset server and PNG loader.
fn asset_app(config: GameConfig, main_menu: impl StateScene) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(AssetPlugin::default());
    app.add_plugins(ImagePlugin::default());
    app.add_plugins(StatesPlugin);
    app.init_state::<GameState>();
    app.insert_resource(config);
    app.add_plugins(SceneFlowPlugin);
    app.register_scene(GameState::Start, Plain);
    app.register_scene(GameState::MainMenu, main_menu);
    app
}

/// Finish plugin setup and enter Start.
fn boot(app: &mut App) -> Entity {
    app.finish();
    app.cleanup();
    app.update();
    assert_eq!(state(app), GameState::Start);
    director(app).active_root().unwrap()
}

fn state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

fn director(app: &App) -> &SceneDirector {
    app.world().resource::<SceneDirector>()
}

fn request(app: &mut App, request: SceneRequest) {
    app.world_mut()
        .resource_mut::<SceneDirector>()
        .request(request);
    app.update();
}

fn root_for(app: &mut App, target: GameState) -> Option<Entity> {
    app.world_mut()
        .query::<(Entity, &SceneRoot)>()
        .iter(app.world())
        .find(|(_, root)| root.state == target)
        .map(|(entity, _)| entity)
}

fn owned_by(app: &mut App, root: Entity) -> usize {
    app.world_mut()
        .query::<&SceneOwned>()
        .iter(app.world())
        .filter(|owner| owner.0 == root)
        .count()
}

/// Update until the director settles, with a bounded number of frames for
/// asset IO on the task pools.
fn settle(app: &mut App) {
    for _ in 0..500 {
        if director(app).is_idle() {
            return;
        }
        app.update();
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("director never settled");
}

fn assert_start_still_active(app: &mut App, start_root: Entity) {
    assert_eq!(state(app), GameState::Start);
    assert_eq!(director(app).active_root(), Some(start_root));
    assert!(app.world().get::<ActiveScene>(start_root).is_some());
    let active = app
        .world_mut()
        .query_filtered::<Entity, With<ActiveScene>>()
        .iter(app.world())
        .collect::<Vec<_>>();
    assert_eq!(active, vec![start_root]);
}

// ---------------------------------------------------------------------------
// Test 1: a texture that fails to load aborts the transition
// ---------------------------------------------------------------------------

#[test]
fn failed_texture_aborts_and_keeps_previous_scene() {
    let mut app = asset_app(GameConfig::default(), MissingTexture);
    let start_root = boot(&mut app);

    request(&mut app, SceneRequest::Goto(GameState::MainMenu));
    let pending = root_for(&mut app, GameState::MainMenu).expect("pending scene built");
    assert_eq!(director(&app).in_flight(), Some(GameState::MainMenu));

    settle(&mut app);

    assert_start_still_active(&mut app, start_root);
    assert!(app.world().get_entity(pending).is_err());
    assert_eq!(owned_by(&mut app, pending), 0);
    assert_eq!(
        app.world_mut()
            .query::<&SceneRoot>()
            .iter(app.world())
            .count(),
        1
    );
}

// ---------------------------------------------------------------------------
// Test 2: a handle still loading holds the commit until the timeout
// ---------------------------------------------------------------------------

#[test]
fn loading_handle_holds_commit_until_timeout() {
    let mut app = asset_app(
        GameConfig {
            readiness_timeout_secs: 1.0,
            ..GameConfig::default()
        },
        Stalled,
    );
    let start_root = boot(&mut app);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));

    request(&mut app, SceneRequest::Goto(GameState::MainMenu));
    let pending = root_for(&mut app, GameState::MainMenu).expect("pending scene built");

    for _ in 0..5 {
        app.update();
        assert_eq!(director(&app).in_flight(), Some(GameState::MainMenu));
        assert_start_still_active(&mut app, start_root);
        let mut owned = app.world_mut().query::<(&SceneOwned, &Visibility)>();
        for (owner, visibility) in owned.iter(app.world()) {
            if owner.0 == pending {
                assert_eq!(*visibility, Visibility::Hidden);
            }
        }
    }

    for _ in 0..10 {
        app.update();
    }
    assert!(director(&app).is_idle());
    assert_start_still_active(&mut app, start_root);
    assert!(app.world().get_entity(pending).is_err());
    assert_eq!(owned_by(&mut app, pending), 0);

    // The director takes new requests after an abort.
    app.world_mut()
        .resource_mut::<SceneDirector>()
        .register(GameState::MainMenu, Plain);
    request(&mut app, SceneRequest::Goto(GameState::MainMenu));
    assert_eq!(state(&app), GameState::MainMenu);
}

// ---------------------------------------------------------------------------
// Test 3: the forest commits once every shipped texture has loaded
// ---------------------------------------------------------------------------

#[test]
fn forest_commits_with_shipped_textures() {
    let mut app = asset_app(
        GameConfig {
            rabbit_count: 3,
            collect_target: 3,
            ..GameConfig::default()
        },
        Plain,
    );
    app.register_scene(GameState::SoloMenu, Plain);
    app.add_plugins(EnvironmentPlugin);
    boot(&mut app);

    request(&mut app, SceneRequest::Goto(GameState::MainMenu));
    request(&mut app, SceneRequest::Goto(GameState::SoloMenu));
    assert_eq!(state(&app), GameState::SoloMenu);

    request(&mut app, SceneRequest::StartGame);
    settle(&mut app);
    app.update();

    assert_eq!(state(&app), GameState::GameSolo);
    let root = director(&app).active_root().unwrap();
    assert!(!app.world().get::<SceneWaits>(root).unwrap().0.is_empty());
    assert_eq!(
        app.world_mut()
            .query_filtered::<(), With<Player>>()
            .iter(app.world())
            .count(),
        1
    );
}
