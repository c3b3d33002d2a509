//! Win and lose screens: show the tally and return to the main menu.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::app_state::GameState;
use crate::events::{Cue, UiCue};
use crate::plugins::camera::screen_camera;
use crate::plugins::scene_flow::{
    SceneAppExt, SceneBuilder, SceneDirector, SceneRequest, StateScene,
};
use crate::plugins::ui::{ACCENT, BACKGROUND, MUTED, button, label, screen};
use crate::scoring::ScoreTracker;

pub struct GameOverPlugin;

impl Plugin for GameOverPlugin {
    fn build(&self, app: &mut App) {
        app.register_scene(GameState::Win, EndScreen { won: true })
            .register_scene(GameState::Lose, EndScreen { won: false });
        app.add_systems(Update, end_screen_input);
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackToMenu;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

struct EndScreen {
    won: bool,
}

pub fn tally_line(score: Option<&ScoreTracker>) -> String {
    let (collected, target) = score.map(|s| (s.collected(), s.target())).unwrap_or((0, 10));
    format!("You found {} / {} rabbits.", collected, target)
}

impl StateScene for EndScreen {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        let tally = tally_line(scene.world().get_resource::<ScoreTracker>());
        let (title, subtitle) = if self.won {
            ("You Win!", "The forest is safe again.")
        } else {
            ("Time's Up", "Some rabbits got away.")
        };
        scene.spawn(screen_camera());
        scene.spawn(screen(BACKGROUND)).with_children(|parent| {
            parent.spawn(label(title, 56.0, ACCENT));
            parent.spawn(label(subtitle, 20.0, MUTED));
            parent.spawn(label(tally, 26.0, Color::WHITE));
            parent.spawn(button(BackToMenu, "Go To Menu"));
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

#[span_fn]
fn end_screen_input(
    mut commands: Commands,
    state: Option<Res<State<GameState>>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    buttons: Query<&Interaction, (Changed<Interaction>, With<BackToMenu>)>,
    mut director: ResMut<SceneDirector>,
) {
    if !state.is_some_and(|s| matches!(s.get(), GameState::Win | GameState::Lose)) {
        return;
    }
    let clicked = buttons.iter().any(|i| *i == Interaction::Pressed);
    if (clicked || keyboard.just_pressed(KeyCode::Enter))
        && director.request(SceneRequest::Goto(GameState::MainMenu))
    {
        info!("returning to menu");
        commands.trigger(UiCue(Cue::Confirm));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
