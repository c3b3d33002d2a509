//! Scene director: turns transition requests into built, readied, committed
//! and disposed scenes.
//!
//! A scene is a [`SceneRoot`] entity plus every top-level entity tagged
//! [`SceneOwned`] with it. Builders spawn their entities hidden and their
//! cameras inactive; the commit reveals them in the same exclusive system that
//! despawns the previous scene, so no frame ever shows two scenes.
//!
//! The director also owns the session lifecycle: the session resets on the
//! main menu, the multiplayer menu forces two players, and entering a
//! gameplay state starts a fresh tally.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bevy::asset::{Asset, LoadState};
use bevy::prelude::*;
use micromegas_tracing::prelude::{error, imetric, info, span_scope, span_fn, warn};

use crate::app_state::{GameState, configure_game_sets};
use crate::components::{ActiveScene, SceneOwned, SceneRoot, SceneWaits};
use crate::config::GameConfig;
use crate::resources::SessionStatus;
use crate::scoring::ScoreTracker;
use crate::transition::{
    Committed, PendingScene, Readiness, SceneStateMachine, Step, TransitionError,
};

pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SceneFlowPlugin;

impl Plugin for SceneFlowPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneDirector>();
        app.init_resource::<SessionStatus>();
        configure_game_sets(app);

        app.add_systems(PreUpdate, drive_scenes);

        app.add_systems(OnEnter(GameState::MainMenu), reset_session);
        app.add_systems(OnEnter(GameState::MultiMenu), force_two_players);
        app.add_systems(OnEnter(GameState::GameSolo), start_session);
        app.add_systems(OnEnter(GameState::GameMulti), start_session);
    }
}

// ---------------------------------------------------------------------------
// Requests and builders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    /// Build and enter `GameState`.
    Goto(GameState),
    /// Build the gameplay scene for the current session without entering it.
    PreloadGame,
    /// Drop the preloaded gameplay scene.
    DiscardPreload,
    /// Enter gameplay, using the preloaded scene when there is one.
    StartGame,
}

/// While present, the director holds the first transition out of `Loading`.
#[derive(Resource, Debug, Default)]
pub struct HoldBoot;

/// Builds the scene for one state.
pub trait StateScene: Send + Sync + 'static {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String>;
}

/// Spawning context handed to a [`StateScene`].
pub struct SceneBuilder<'w> {
    world: &'w mut World,
    root: Entity,
    target: GameState,
    waits: Vec<UntypedHandle>,
}

impl<'w> SceneBuilder<'w> {
    fn new(world: &'w mut World, root: Entity, target: GameState) -> Self {
        Self {
            world,
            root,
            target,
            waits: Vec::new(),
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn target(&self) -> GameState {
        self.target
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// Spawn a top-level entity of this scene. It stays hidden until commit.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> EntityWorldMut<'_> {
        let root = self.root;
        let mut entity = self.world.spawn(bundle);
        entity.insert((SceneOwned(root), Visibility::Hidden));
        entity
    }

    /// Start loading an asset the scene cannot be shown without. Without an
    /// asset server this is a default handle and nothing is awaited.
    pub fn load<A: Asset>(&mut self, path: &str) -> Handle<A> {
        let Some(server) = self.world.get_resource::<AssetServer>() else {
            return Handle::default();
        };
        let handle: Handle<A> = server.load(path.to_owned());
        self.await_asset(handle.clone());
        handle
    }

    /// Hold the commit until `handle` has loaded.
    pub fn await_asset(&mut self, handle: impl Into<UntypedHandle>) {
        self.waits.push(handle.into());
    }

    pub fn add_layout(&mut self, layout: TextureAtlasLayout) -> Handle<TextureAtlasLayout> {
        match self.world.get_resource_mut::<Assets<TextureAtlasLayout>>() {
            Some(mut layouts) => layouts.add(layout),
            None => Handle::default(),
        }
    }

    fn into_waits(self) -> Vec<UntypedHandle> {
        self.waits
    }
}

pub trait SceneAppExt {
    fn register_scene(&mut self, state: GameState, scene: impl StateScene) -> &mut Self;
}

impl SceneAppExt for App {
    fn register_scene(&mut self, state: GameState, scene: impl StateScene) -> &mut Self {
        self.init_resource::<SceneDirector>();
        self.world_mut()
            .resource_mut::<SceneDirector>()
            .register(state, scene);
        self
    }
}

// ---------------------------------------------------------------------------
// Director
// ---------------------------------------------------------------------------

#[derive(Resource)]
pub struct SceneDirector {
    machine: SceneStateMachine<Entity>,
    queue: VecDeque<SceneRequest>,
    scenes: HashMap<GameState, Box<dyn StateScene>>,
    booted: bool,
}

impl Default for SceneDirector {
    fn default() -> Self {
        Self {
            machine: SceneStateMachine::new(DEFAULT_READINESS_TIMEOUT),
            queue: VecDeque::new(),
            scenes: HashMap::new(),
            booted: false,
        }
    }
}

impl SceneDirector {
    pub fn register(&mut self, state: GameState, scene: impl StateScene) {
        self.scenes.insert(state, Box::new(scene));
    }

    /// Queue a request. A request already waiting in the queue is dropped.
    pub fn request(&mut self, request: SceneRequest) -> bool {
        if self.queue.contains(&request) {
            return false;
        }
        self.queue.push_back(request);
        true
    }

    /// No transition in flight and nothing queued.
    pub fn is_idle(&self) -> bool {
        !self.machine.is_busy() && self.queue.is_empty()
    }

    pub fn state(&self) -> GameState {
        self.machine.state()
    }

    pub fn active_root(&self) -> Option<Entity> {
        self.machine.active().copied()
    }

    pub fn in_flight(&self) -> Option<GameState> {
        self.machine.in_flight_target()
    }

    pub fn preloaded_root(&self) -> Option<Entity> {
        self.machine.preloaded().map(|p| *p.handle())
    }

    fn drive(&mut self, world: &mut World) {
        let now = world
            .get_resource::<Time>()
            .map(|t| t.elapsed())
            .unwrap_or_default();

        if !self.machine.is_busy() {
            if !self.booted
                && self.machine.state() == GameState::Loading
                && !world.contains_resource::<HoldBoot>()
            {
                self.booted = true;
                self.queue.push_front(SceneRequest::Goto(GameState::Start));
            }
            if let Some(request) = self.queue.pop_front() {
                self.begin(world, request, now);
            }
        }

        let Some(root) = self.machine.in_flight_handle().copied() else {
            return;
        };
        match self.machine.poll(readiness(world, root), now) {
            Step::Commit => self.commit(world),
            Step::Abort(err) => {
                error!("transition aborted: {}", err);
                if let Some(pending) = self.machine.abort() {
                    dispose_scene(world, pending);
                }
            }
            Step::Waiting | Step::Idle => {}
        }
    }

    fn begin(&mut self, world: &mut World, request: SceneRequest, now: Duration) {
        span_scope!("scene_begin");
        match request {
            SceneRequest::Goto(target) => self.build_and_stage(world, target, now),
            SceneRequest::StartGame => {
                let target = session_target(world);
                if let Err(err) = self.machine.validate(target) {
                    warn!("cannot start game: {}", err);
                    return;
                }
                match self.machine.take_preload(target) {
                    Some(pending) => self.stage(world, pending, now),
                    None => self.build_and_stage(world, target, now),
                }
            }
            SceneRequest::PreloadGame => {
                let target = session_target(world);
                if let Err(err) = self.machine.validate(target) {
                    warn!("cannot preload game: {}", err);
                    return;
                }
                let Some(root) = self.build(world, target) else {
                    return;
                };
                match self.machine.preload(PendingScene::new(root, target)) {
                    Ok(replaced) => {
                        info!("preloaded {:?}", target);
                        if let Some(old) = replaced {
                            dispose_scene(world, old);
                        }
                    }
                    Err(rejected) => {
                        warn!("preload rejected: {}", rejected.error);
                        dispose_scene(world, rejected.pending.into_handle());
                    }
                }
            }
            SceneRequest::DiscardPreload => {
                if let Some(root) = self.machine.discard_preload() {
                    info!("discarded preloaded game");
                    dispose_scene(world, root);
                }
            }
        }
    }

    fn build_and_stage(&mut self, world: &mut World, target: GameState, now: Duration) {
        if let Err(err) = self.machine.validate(target) {
            error!("{}", err);
            return;
        }
        if let Some(root) = self.build(world, target) {
            self.stage(world, PendingScene::new(root, target), now);
        }
    }

    fn stage(&mut self, world: &mut World, pending: PendingScene<Entity>, now: Duration) {
        if let Some(config) = world.get_resource::<GameConfig>() {
            self.machine.set_timeout(config.readiness_timeout());
        }
        if let Err(rejected) = self.machine.stage(pending, now) {
            error!("{}", rejected.error);
            dispose_scene(world, rejected.pending.into_handle());
        }
    }

    /// Build the scene for `target`. A failed build leaves nothing behind.
    fn build(&self, world: &mut World, target: GameState) -> Option<Entity> {
        span_scope!("scene_build");
        let root = world.spawn(SceneRoot { state: target }).id();
        let result = match self.scenes.get(&target) {
            Some(scene) => {
                let mut builder = SceneBuilder::new(world, root, target);
                let result = scene.build(&mut builder);
                let waits = builder.into_waits();
                if let Ok(mut entity) = world.get_entity_mut(root) {
                    entity.insert(SceneWaits(waits));
                }
                result
            }
            None => Err("no scene registered".to_string()),
        };
        match result {
            Ok(()) => Some(root),
            Err(reason) => {
                error!("{}", TransitionError::Build { target, reason });
                dispose_scene(world, root);
                None
            }
        }
    }

    fn commit(&mut self, world: &mut World) {
        let Some(Committed { state, dispose }) = self.machine.commit() else {
            return;
        };
        let _span = tracing::info_span!("scene_transition", name = ?state).entered();
        if let Some(root) = self.active_root() {
            reveal(world, root);
            if let Ok(mut entity) = world.get_entity_mut(root) {
                entity.insert(ActiveScene);
            }
        }
        for root in dispose {
            dispose_scene(world, root);
        }
        if let Some(mut next) = world.get_resource_mut::<NextState<GameState>>() {
            next.set(state);
        }
        imetric!("scene_transitions", "count", 1);
        info!("entered {:?}", state);
    }
}

fn session_target(world: &World) -> GameState {
    world
        .get_resource::<SessionStatus>()
        .map(SessionStatus::gameplay_state)
        .unwrap_or(GameState::GameSolo)
}

/// Load status of every asset the scene waits on.
fn readiness(world: &World, root: Entity) -> Readiness {
    let Some(waits) = world.get::<SceneWaits>(root) else {
        return Readiness::Ready;
    };
    let Some(server) = world.get_resource::<AssetServer>() else {
        return Readiness::Ready;
    };
    let mut pending = false;
    for handle in &waits.0 {
        match server.load_state(handle.id()) {
            LoadState::Loaded => {}
            LoadState::Failed(err) => return Readiness::Failed(err.to_string()),
            _ => pending = true,
        }
    }
    if pending {
        Readiness::Loading
    } else {
        Readiness::Ready
    }
}

fn reveal(world: &mut World, root: Entity) {
    let mut query = world.query::<(&SceneOwned, Option<&mut Visibility>, Option<&mut Camera>)>();
    for (owned, visibility, camera) in query.iter_mut(world) {
        if owned.0 != root {
            continue;
        }
        if let Some(mut visibility) = visibility {
            *visibility = Visibility::Inherited;
        }
        if let Some(mut camera) = camera {
            camera.is_active = true;
        }
    }
}

/// Despawn a scene root and everything it owns.
pub fn dispose_scene(world: &mut World, root: Entity) {
    let owned: Vec<Entity> = world
        .query::<(Entity, &SceneOwned)>()
        .iter(world)
        .filter(|(_, owner)| owner.0 == root)
        .map(|(entity, _)| entity)
        .collect();
    for entity in owned {
        if let Ok(entity) = world.get_entity_mut(entity) {
            entity.despawn();
        }
    }
    if let Ok(entity) = world.get_entity_mut(root) {
        entity.despawn();
    }
}

fn drive_scenes(world: &mut World) {
    world.resource_scope(|world, mut director: Mut<SceneDirector>| director.drive(world));
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[span_fn]
fn reset_session(mut commands: Commands) {
    commands.insert_resource(SessionStatus::default());
    commands.remove_resource::<ScoreTracker>();
}

#[span_fn]
fn force_two_players(mut session: ResMut<SessionStatus>) {
    session.player_count = 2;
}

#[span_fn]
fn start_session(
    mut commands: Commands,
    config: Option<Res<GameConfig>>,
    mut session: ResMut<SessionStatus>,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();
    session.paused = false;
    session.exit_requested = false;
    commands.insert_resource(ScoreTracker::new(config.session_secs, config.collect_target));
    info!(
        "session started: {} player(s), {}s",
        session.player_count, config.session_secs
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
