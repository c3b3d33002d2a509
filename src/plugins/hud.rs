//! HUD overlay: countdown, rabbit counter, pause menu and pickup feedback.
//!
//! The HUD belongs to the gameplay scene and is built with it, targeted at
//! the scene's UI camera so it covers both split viewports.

use bevy::prelude::*;
use micromegas_tracing::prelude::{imetric, info, span_fn, span_scope};

use crate::app_state::GameSet;
use crate::components::{ActiveScene, SceneOwned};
use crate::config::GameConfig;
use crate::events::{Cue, RabbitCollected, UiCue};
use crate::plugins::scene_flow::{SceneBuilder, SceneDirector, SceneRequest};
use crate::plugins::ui::{ACCENT, button};
use crate::resources::SessionStatus;
use crate::scoring::ScoreTracker;

/// Diameter of a pickup feedback disc in logical pixels.
pub const FEEDBACK_SIZE: f32 = 40.0;

/// Interval between feedback disc steps.
pub const FEEDBACK_STEP_SECS: f32 = 0.01;

/// Number of steps a disc takes to cross half the window.
const FEEDBACK_STEPS: f32 = 10.0;

pub const RABBIT_ICON: &str = "textures/ui/rabbit.png";
pub const FEEDBACK_DISC: &str = "textures/ui/feedback.png";

/// Window size assumed when there is no window.
const FALLBACK_WINDOW: Vec2 = Vec2::new(1280.0, 720.0);

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, tick_score.in_set(GameSet::Scoring));
        app.add_systems(
            Update,
            (pause_keys, pause_buttons, check_outcome)
                .chain()
                .in_set(GameSet::Outcome),
        );
        app.add_systems(
            Update,
            (update_hud_text, sync_pause_overlay, fly_feedback).in_set(GameSet::Presentation),
        );
        app.add_observer(on_rabbit_collected);
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Root node of the HUD. Holds the disc image used for pickup feedback.
#[derive(Component)]
pub struct HudRoot {
    pub disc: Handle<Image>,
}

#[derive(Component)]
pub struct TimerText;

#[derive(Component)]
pub struct CounterText;

#[derive(Component)]
pub struct PauseOverlay;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseAction {
    Resume,
    Exit,
}

/// White disc flying from a player's view to the counter.
#[derive(Component, Debug)]
pub struct FeedbackDisc {
    pub rabbit: Entity,
    /// Offset of the disc centre from the window centre, in logical pixels.
    pub offset: Vec2,
    pub step: Vec2,
    pub hold: Timer,
    pub tick: Timer,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Spawn the HUD of a gameplay scene onto `ui_camera`, showing `score`
/// until the running session takes over.
pub fn spawn_hud(scene: &mut SceneBuilder, ui_camera: Entity, score: &ScoreTracker) -> Entity {
    let icon = scene.load::<Image>(RABBIT_ICON);
    let disc = scene.load::<Image>(FEEDBACK_DISC);
    scene
        .spawn((
            HudRoot { disc },
            UiTargetCamera(ui_camera),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                ..default()
            },
        ))
        .with_children(|parent| {
            parent
                .spawn(Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(16.0),
                    align_items: AlignItems::Center,
                    column_gap: Val::Px(10.0),
                    ..default()
                })
                .with_children(|row| {
                    row.spawn((
                        ImageNode::new(icon),
                        Node {
                            width: Val::Px(56.0),
                            height: Val::Px(56.0),
                            ..default()
                        },
                    ));
                    row.spawn((
                        CounterText,
                        Text::new(score.counter_text()),
                        TextColor(ACCENT),
                        TextFont {
                            font_size: 40.0,
                            ..default()
                        },
                    ));
                });

            parent
                .spawn(Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    width: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    ..default()
                })
                .with_children(|row| {
                    row.spawn((
                        TimerText,
                        Text::new(score.timer_text()),
                        TextColor(ACCENT),
                        TextFont {
                            font_size: 40.0,
                            ..default()
                        },
                    ));
                });

            parent
                .spawn((
                    PauseOverlay,
                    Node {
                        position_type: PositionType::Absolute,
                        width: Val::Percent(100.0),
                        height: Val::Percent(100.0),
                        flex_direction: FlexDirection::Column,
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        row_gap: Val::Px(24.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.3)),
                    GlobalZIndex(5),
                    Visibility::Hidden,
                ))
                .with_children(|overlay| {
                    overlay.spawn(button(PauseAction::Resume, "Resume"));
                    overlay.spawn(button(PauseAction::Exit, "Exit"));
                });
        })
        .id()
}

// ---------------------------------------------------------------------------
// Feedback geometry
// ---------------------------------------------------------------------------

/// Horizontal share of the window a player's view is centred on.
fn view_ratio(slot: usize) -> f32 {
    if slot == 0 { -0.25 } else { 0.25 }
}

/// Start offset of a disc: the centre of the collecting player's view.
pub fn feedback_start(window: Vec2, slot: usize, players: u8) -> Vec2 {
    if players < 2 {
        Vec2::ZERO
    } else {
        Vec2::new(window.x * view_ratio(slot), 0.0)
    }
}

/// Per-step travel of a disc toward the top-left corner.
pub fn feedback_step(window: Vec2, slot: usize, players: u8) -> Vec2 {
    let half = window / 2.0;
    let dx = if players < 2 {
        half.x
    } else {
        half.x + window.x * view_ratio(slot)
    };
    Vec2::new(dx, half.y) / FEEDBACK_STEPS
}

/// Node position of a disc whose centre sits at `offset` from the window centre.
fn disc_node_position(window: Vec2, offset: Vec2) -> (Val, Val) {
    let corner = window / 2.0 + offset - Vec2::splat(FEEDBACK_SIZE / 2.0);
    (Val::Px(corner.x), Val::Px(corner.y))
}

fn window_size(windows: &Query<&Window>) -> Vec2 {
    windows
        .iter()
        .next()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(FALLBACK_WINDOW)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

#[span_fn]
fn tick_score(
    time: Res<Time>,
    session: Res<SessionStatus>,
    score: Option<ResMut<ScoreTracker>>,
) {
    if let Some(mut score) = score {
        score.tick(time.delta_secs(), session.paused);
    }
}

/// Record the pickup and launch its feedback disc from the collector's view.
fn on_rabbit_collected(
    event: On<RabbitCollected>,
    mut commands: Commands,
    score: Option<ResMut<ScoreTracker>>,
    session: Option<Res<SessionStatus>>,
    windows: Query<&Window>,
    huds: Query<(Entity, &HudRoot, &SceneOwned)>,
    active: Query<Entity, With<ActiveScene>>,
    config: Option<Res<GameConfig>>,
) {
    let Some(mut score) = score else {
        return;
    };
    let collected = score.record_collection();
    imetric!("rabbits_collected", "count", 1);
    info!("collected {} / {}", collected, score.target());

    let players = session.map(|s| s.player_count).unwrap_or(1);
    let window = window_size(&windows);
    let Some((hud, root, _)) = huds
        .iter()
        .find(|(_, _, owner)| active.iter().any(|scene| scene == owner.0))
    else {
        commands.entity(event.rabbit).try_despawn();
        return;
    };
    let hold = config.map(|c| c.feedback_delay_secs).unwrap_or(0.25);
    let offset = feedback_start(window, event.slot, players);
    let (left, top) = disc_node_position(window, offset);
    commands.entity(hud).with_child((
        FeedbackDisc {
            rabbit: event.rabbit,
            offset,
            step: feedback_step(window, event.slot, players),
            hold: Timer::from_seconds(hold, TimerMode::Once),
            tick: Timer::from_seconds(FEEDBACK_STEP_SECS, TimerMode::Repeating),
        },
        Node {
            position_type: PositionType::Absolute,
            width: Val::Px(FEEDBACK_SIZE),
            height: Val::Px(FEEDBACK_SIZE),
            left,
            top,
            ..default()
        },
        ImageNode::new(root.disc.clone()),
    ));
}

/// Hold each disc, then step it up-left until it leaves the window, and
/// despawn it along with its rabbit.
#[span_fn]
fn fly_feedback(
    mut commands: Commands,
    time: Res<Time>,
    windows: Query<&Window>,
    mut discs: Query<(Entity, &mut FeedbackDisc, &mut Node)>,
) {
    let window = window_size(&windows);
    for (entity, mut disc, mut node) in &mut discs {
        disc.hold.tick(time.delta());
        if !disc.hold.is_finished() {
            continue;
        }
        disc.tick.tick(time.delta());
        for _ in 0..disc.tick.times_finished_this_tick() {
            if disc.offset.x > -(window.x / 2.0) {
                let step = disc.step;
                disc.offset -= step;
            } else {
                commands.entity(entity).try_despawn();
                commands.entity(disc.rabbit).try_despawn();
                break;
            }
        }
        let (left, top) = disc_node_position(window, disc.offset);
        node.left = left;
        node.top = top;
    }
}

fn update_hud_text(
    score: Option<Res<ScoreTracker>>,
    mut timers: Query<&mut Text, (With<TimerText>, Without<CounterText>)>,
    mut counters: Query<&mut Text, (With<CounterText>, Without<TimerText>)>,
) {
    let Some(score) = score else {
        return;
    };
    if !score.is_changed() {
        return;
    }
    for mut text in &mut timers {
        **text = score.timer_text();
    }
    for mut text in &mut counters {
        **text = score.counter_text();
    }
}

fn toggle_pause(commands: &mut Commands, session: &mut SessionStatus) {
    let paused = session.toggle_pause();
    info!("paused: {}", paused);
    commands.trigger(UiCue(if paused { Cue::Pause } else { Cue::Unpause }));
}

/// Escape toggles the pause menu on release.
#[span_fn]
fn pause_keys(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut session: ResMut<SessionStatus>,
) {
    if keyboard.just_released(KeyCode::Escape) {
        toggle_pause(&mut commands, &mut session);
    }
}

#[span_fn]
fn pause_buttons(
    mut commands: Commands,
    buttons: Query<(&Interaction, &PauseAction), Changed<Interaction>>,
    mut session: ResMut<SessionStatus>,
) {
    for (interaction, action) in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match action {
            PauseAction::Resume => {
                if session.paused {
                    toggle_pause(&mut commands, &mut session);
                }
            }
            PauseAction::Exit => {
                session.exit_requested = true;
                commands.trigger(UiCue(Cue::Confirm));
            }
        }
    }
}

fn sync_pause_overlay(
    session: Res<SessionStatus>,
    mut overlays: Query<&mut Visibility, With<PauseOverlay>>,
) {
    if !session.is_changed() {
        return;
    }
    for mut visibility in &mut overlays {
        visibility.set_if_neq(if session.paused {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
}

/// Ask for the end screen once the session is decided. Runs only while no
/// transition is queued or in flight.
#[span_fn]
fn check_outcome(
    score: Option<Res<ScoreTracker>>,
    session: Res<SessionStatus>,
    mut director: ResMut<SceneDirector>,
) {
    if !director.is_idle() {
        return;
    }
    let Some(score) = score else {
        return;
    };
    if let Some(outcome) = score.outcome(session.exit_requested) {
        info!(
            "session over: {:?} with {} / {}",
            outcome,
            score.collected(),
            score.target()
        );
        director.request(SceneRequest::Goto(outcome.state()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
