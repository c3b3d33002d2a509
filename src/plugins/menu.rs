//! Menu screens: start, main menu, level select, multiplayer setup and options.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::ui::FocusPolicy;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::app_state::GameState;
use crate::config::GameConfig;
use crate::events::{Cue, UiCue};
use crate::input::CONTROL_SCHEMES;
use crate::plugins::camera::screen_camera;
use crate::plugins::scene_flow::{
    SceneAppExt, SceneBuilder, SceneDirector, SceneRequest, StateScene,
};
use crate::plugins::ui::{
    ACCENT, BACKGROUND, MUTED, button, button_feedback, label, screen, small_button,
};
use crate::resources::{AudioSettings, AudioTrack, SessionStatus, VOLUME_STEP};

pub struct MenuPlugin;

impl Plugin for MenuPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioSettings>();
        app.register_scene(GameState::Start, StartScene)
            .register_scene(GameState::MainMenu, MainMenuScene)
            .register_scene(GameState::SoloMenu, SoloMenuScene)
            .register_scene(GameState::MultiMenu, MultiMenuScene)
            .register_scene(GameState::Options, OptionsScene);
        app.add_systems(
            Update,
            (menu_buttons, menu_keys, refresh_volume_labels, button_feedback),
        );
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Solo,
    Multi,
    Options,
    Back,
    ChooseLevel,
    OpenLevel,
    CloseLevel,
    StartGame,
    Volume(AudioTrack, i16),
}

/// Level details overlay on the level select screen.
#[derive(Component, Debug)]
pub struct LevelModal;

#[derive(Component, Debug)]
pub struct VolumeLabel(pub AudioTrack);

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

struct StartScene;

impl StateScene for StartScene {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        scene.spawn(screen_camera());
        scene.spawn(screen(BACKGROUND)).with_children(|parent| {
            parent.spawn(label("RABBIT HUNT", 64.0, ACCENT));
            parent.spawn(label(
                "The rabbits have invaded the forest. Catch them all.",
                18.0,
                MUTED,
            ));
            parent.spawn(button(MenuAction::Play, "Play"));
            parent.spawn(label("Press Enter to Start", 18.0, MUTED));
        });
        Ok(())
    }
}

struct MainMenuScene;

impl StateScene for MainMenuScene {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        scene.spawn(screen_camera());
        scene.spawn(screen(BACKGROUND)).with_children(|parent| {
            parent.spawn(label("RABBIT HUNT", 56.0, ACCENT));
            parent.spawn(button(MenuAction::Solo, "Solo"));
            parent.spawn(button(MenuAction::Multi, "Multiplayer"));
            parent.spawn(button(MenuAction::Options, "Options"));
        });
        Ok(())
    }
}

struct SoloMenuScene;

impl StateScene for SoloMenuScene {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        let config = scene
            .world()
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();
        let players = scene
            .world()
            .get_resource::<SessionStatus>()
            .map(|s| s.player_count)
            .unwrap_or(1);

        scene.spawn(screen_camera());
        scene.spawn(screen(BACKGROUND)).with_children(|parent| {
            parent.spawn(label("Choose a level", 48.0, ACCENT));
            parent.spawn(button(MenuAction::OpenLevel, "The Rabbit Invasion"));
            parent.spawn(button(MenuAction::Back, "Back"));

            parent
                .spawn((
                    LevelModal,
                    MenuAction::CloseLevel,
                    Interaction::default(),
                    FocusPolicy::Block,
                    Node {
                        position_type: PositionType::Absolute,
                        width: Val::Percent(100.0),
                        height: Val::Percent(100.0),
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                    Visibility::Hidden,
                ))
                .with_children(|modal| {
                    modal
                        .spawn((
                            Node {
                                flex_direction: FlexDirection::Column,
                                align_items: AlignItems::Center,
                                row_gap: Val::Px(14.0),
                                padding: UiRect::all(Val::Px(32.0)),
                                ..default()
                            },
                            BackgroundColor(BACKGROUND),
                            Interaction::default(),
                            FocusPolicy::Block,
                        ))
                        .with_children(|panel| {
                            panel.spawn(label("The Rabbit Invasion", 36.0, ACCENT));
                            panel.spawn(label(
                                format!(
                                    "Find all {} rabbits before the time runs out.",
                                    config.collect_target
                                ),
                                20.0,
                                Color::WHITE,
                            ));
                            panel.spawn(label(
                                format!("{} seconds", config.session_secs.round() as i64),
                                20.0,
                                MUTED,
                            ));
                            for line in controls_hint(players) {
                                panel.spawn(label(line, 18.0, MUTED));
                            }
                            panel.spawn(button(MenuAction::StartGame, "Start"));
                        });
                });
        });
        Ok(())
    }
}

struct MultiMenuScene;

impl StateScene for MultiMenuScene {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        scene.spawn(screen_camera());
        scene.spawn(screen(BACKGROUND)).with_children(|parent| {
            parent.spawn(label("Multiplayer", 48.0, ACCENT));
            parent
                .spawn(Node {
                    column_gap: Val::Px(40.0),
                    ..default()
                })
                .with_children(|row| {
                    for slot in 0..CONTROL_SCHEMES.len() {
                        row.spawn((
                            Node {
                                flex_direction: FlexDirection::Column,
                                align_items: AlignItems::Center,
                                row_gap: Val::Px(8.0),
                                padding: UiRect::all(Val::Px(20.0)),
                                ..default()
                            },
                            BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.06)),
                        ))
                        .with_children(|panel| {
                            panel.spawn(label(format!("Player {}", slot + 1), 28.0, Color::WHITE));
                            panel.spawn(label(scheme_name(slot), 20.0, MUTED));
                        });
                    }
                });
            parent.spawn(button(MenuAction::ChooseLevel, "Choose a level"));
            parent.spawn(button(MenuAction::Back, "Back"));
        });
        Ok(())
    }
}

struct OptionsScene;

impl StateScene for OptionsScene {
    fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
        let settings = scene
            .world()
            .get_resource::<AudioSettings>()
            .copied()
            .unwrap_or_default();

        scene.spawn(screen_camera());
        scene.spawn(screen(BACKGROUND)).with_children(|parent| {
            parent.spawn(label("Options", 48.0, ACCENT));
            for (track, name) in [
                (AudioTrack::Ambient, "Ambient"),
                (AudioTrack::Music, "Music"),
                (AudioTrack::Sfx, "Effects"),
            ] {
                parent
                    .spawn(Node {
                        align_items: AlignItems::Center,
                        column_gap: Val::Px(16.0),
                        ..default()
                    })
                    .with_children(|row| {
                        row.spawn((
                            label(name, 24.0, Color::WHITE),
                            Node {
                                width: Val::Px(120.0),
                                ..default()
                            },
                        ));
                        row.spawn(small_button(
                            MenuAction::Volume(track, -(VOLUME_STEP as i16)),
                            "-",
                        ));
                        row.spawn((
                            VolumeLabel(track),
                            label(format!("{}%", settings.get(track)), 24.0, ACCENT),
                            Node {
                                width: Val::Px(80.0),
                                justify_content: JustifyContent::Center,
                                ..default()
                            },
                        ));
                        row.spawn(small_button(
                            MenuAction::Volume(track, VOLUME_STEP as i16),
                            "+",
                        ));
                    });
            }
            parent.spawn(button(MenuAction::Back, "Back"));
        });
        Ok(())
    }
}

fn scheme_name(slot: usize) -> &'static str {
    match CONTROL_SCHEMES.get(slot) {
        Some(scheme) if scheme.up == KeyCode::KeyW => "W A S D",
        Some(_) => "Arrow keys",
        None => "",
    }
}

fn controls_hint(players: u8) -> Vec<String> {
    let mut lines: Vec<String> = if players >= 2 {
        (0..2)
            .map(|slot| format!("Player {}: {}", slot + 1, scheme_name(slot)))
            .collect()
    } else {
        vec![format!("Move with {}", scheme_name(0))]
    };
    lines.push("Esc to pause".to_string());
    lines
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

#[derive(SystemParam)]
struct MenuContext<'w, 's> {
    commands: Commands<'w, 's>,
    director: ResMut<'w, SceneDirector>,
    settings: ResMut<'w, AudioSettings>,
    modals: Query<'w, 's, &'static mut Visibility, With<LevelModal>>,
}

impl MenuContext<'_, '_> {
    fn level_open(&self) -> bool {
        self.modals.iter().any(|v| *v != Visibility::Hidden)
    }

    fn show_level(&mut self, open: bool) {
        for mut visibility in &mut self.modals {
            *visibility = if open {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }
    }

    fn perform(&mut self, action: MenuAction) {
        info!("menu action {:?}", action);
        let cue = match action {
            MenuAction::Play => self.goto(GameState::MainMenu, Cue::Confirm),
            MenuAction::Solo => self.goto(GameState::SoloMenu, Cue::Confirm),
            MenuAction::Multi => self.goto(GameState::MultiMenu, Cue::Confirm),
            MenuAction::Options => self.goto(GameState::Options, Cue::Confirm),
            MenuAction::ChooseLevel => self.goto(GameState::SoloMenu, Cue::Confirm),
            MenuAction::Back => self.goto(GameState::MainMenu, Cue::Back),
            MenuAction::OpenLevel => {
                self.show_level(true);
                self.director.request(SceneRequest::PreloadGame);
                Some(Cue::Confirm)
            }
            MenuAction::CloseLevel => {
                self.show_level(false);
                self.director.request(SceneRequest::DiscardPreload);
                Some(Cue::Back)
            }
            MenuAction::StartGame => {
                self.director.request(SceneRequest::StartGame);
                Some(Cue::Confirm)
            }
            MenuAction::Volume(track, delta) => {
                self.settings.adjust(track, delta);
                None
            }
        };
        if let Some(cue) = cue {
            self.commands.trigger(UiCue(cue));
        }
    }

    fn goto(&mut self, state: GameState, cue: Cue) -> Option<Cue> {
        self.director
            .request(SceneRequest::Goto(state))
            .then_some(cue)
    }
}

#[span_fn]
fn menu_buttons(
    buttons: Query<(&Interaction, &MenuAction), Changed<Interaction>>,
    mut menu: MenuContext,
) {
    for (interaction, action) in &buttons {
        if *interaction == Interaction::Pressed {
            menu.perform(*action);
        }
    }
}

fn menu_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Option<Res<State<GameState>>>,
    mut menu: MenuContext,
) {
    let Some(state) = state else {
        return;
    };
    let action = match state.get() {
        GameState::Start if keyboard.just_pressed(KeyCode::Enter) => Some(MenuAction::Play),
        GameState::SoloMenu if keyboard.just_pressed(KeyCode::Escape) => {
            if menu.level_open() {
                Some(MenuAction::CloseLevel)
            } else {
                Some(MenuAction::Back)
            }
        }
        GameState::MultiMenu | GameState::Options if keyboard.just_pressed(KeyCode::Escape) => {
            Some(MenuAction::Back)
        }
        _ => None,
    };
    if let Some(action) = action {
        menu.perform(action);
    }
}

fn refresh_volume_labels(
    settings: Res<AudioSettings>,
    mut labels: Query<(&VolumeLabel, &mut Text)>,
) {
    if !settings.is_changed() {
        return;
    }
    for (label, mut text) in &mut labels {
        **text = format!("{}%", settings.get(label.0));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::scene_flow::SceneFlowPlugin;
    use bevy::state::app::StatesPlugin;

    struct Empty;

    impl StateScene for Empty {
        fn build(&self, scene: &mut SceneBuilder) -> Result<(), String> {
            scene.spawn(Node::default());
            Ok(())
        }
    }

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<GameState>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.add_plugins(SceneFlowPlugin);
        app.add_plugins(MenuPlugin);
        app.register_scene(GameState::GameSolo, Empty);
        app.register_scene(GameState::GameMulti, Empty);
        app.update();
        app
    }

    fn state(app: &App) -> GameState {
        *app.world().resource::<State<GameState>>().get()
    }

    fn press(app: &mut App, action: MenuAction) {
        let entity = app
            .world_mut()
            .query::<(Entity, &MenuAction)>()
            .iter(app.world())
            .find(|(_, a)| **a == action)
            .map(|(e, _)| e)
            .expect("button present");
        app.world_mut().entity_mut(entity).insert(Interaction::Pressed);
        app.update();
        app.update();
    }

    fn modal_visibility(app: &mut App) -> Visibility {
        *app.world_mut()
            .query_filtered::<&Visibility, With<LevelModal>>()
            .single(app.world())
            .unwrap()
    }

    #[test]
    fn start_screen_is_first() {
        let app = setup_app();
        assert_eq!(state(&app), GameState::Start);
    }

    #[test]
    fn enter_goes_to_main_menu() {
        let mut app = setup_app();
        let mut input = ButtonInput::<KeyCode>::default();
        input.press(KeyCode::Enter);
        app.insert_resource(input);
        app.update();
        app.update();
        assert_eq!(state(&app), GameState::MainMenu);
    }

    #[test]
    fn menu_navigation_and_back() {
        let mut app = setup_app();
        press(&mut app, MenuAction::Play);
        assert_eq!(state(&app), GameState::MainMenu);
        press(&mut app, MenuAction::Options);
        assert_eq!(state(&app), GameState::Options);
        press(&mut app, MenuAction::Back);
        assert_eq!(state(&app), GameState::MainMenu);
        press(&mut app, MenuAction::Multi);
        assert_eq!(state(&app), GameState::MultiMenu);
        press(&mut app, MenuAction::ChooseLevel);
        assert_eq!(state(&app), GameState::SoloMenu);
    }

    #[test]
    fn level_card_preloads_and_backdrop_discards() {
        let mut app = setup_app();
        press(&mut app, MenuAction::Play);
        press(&mut app, MenuAction::Solo);
        assert_eq!(modal_visibility(&mut app), Visibility::Hidden);

        press(&mut app, MenuAction::OpenLevel);
        assert_eq!(modal_visibility(&mut app), Visibility::Inherited);
        assert!(app.world().resource::<SceneDirector>().preloaded_root().is_some());

        press(&mut app, MenuAction::CloseLevel);
        assert_eq!(modal_visibility(&mut app), Visibility::Hidden);
        assert!(app.world().resource::<SceneDirector>().preloaded_root().is_none());
        assert_eq!(state(&app), GameState::SoloMenu);
    }

    #[test]
    fn start_button_enters_gameplay() {
        let mut app = setup_app();
        press(&mut app, MenuAction::Play);
        press(&mut app, MenuAction::Solo);
        press(&mut app, MenuAction::OpenLevel);
        let preload = app.world().resource::<SceneDirector>().preloaded_root();
        press(&mut app, MenuAction::StartGame);
        assert_eq!(state(&app), GameState::GameSolo);
        assert_eq!(app.world().resource::<SceneDirector>().active_root(), preload);
    }

    #[test]
    fn volume_buttons_adjust_settings_and_label() {
        let mut app = setup_app();
        press(&mut app, MenuAction::Play);
        press(&mut app, MenuAction::Options);
        press(&mut app, MenuAction::Volume(AudioTrack::Music, -10));
        assert_eq!(app.world().resource::<AudioSettings>().music, 90);

        let text = app
            .world_mut()
            .query::<(&VolumeLabel, &Text)>()
            .iter(app.world())
            .find(|(l, _)| l.0 == AudioTrack::Music)
            .map(|(_, t)| t.0.clone())
            .unwrap();
        assert_eq!(text, "90%");
    }

    #[test]
    fn hint_lists_both_schemes_for_two_players() {
        assert_eq!(controls_hint(1), vec!["Move with W A S D", "Esc to pause"]);
        assert_eq!(
            controls_hint(2),
            vec!["Player 1: W A S D", "Player 2: Arrow keys", "Esc to pause"]
        );
    }
}
