use bevy::prelude::*;

use crate::resources::not_paused;

/// Committed top-level state. Only the scene director writes it, at the same
/// moment it swaps the active scene root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
pub enum GameState {
    #[default]
    Loading,
    Start,
    MainMenu,
    SoloMenu,
    MultiMenu,
    Options,
    GameSolo,
    GameMulti,
    Win,
    Lose,
}

impl GameState {
    /// Edge table of the menu flow. Anything not listed here is rejected.
    pub fn allows(self, to: GameState) -> bool {
        use GameState::*;
        matches!(
            (self, to),
            (Loading, Start)
                | (Start, MainMenu)
                | (MainMenu, SoloMenu | MultiMenu | Options)
                | (MultiMenu, SoloMenu | MainMenu)
                | (SoloMenu, GameSolo | GameMulti | MainMenu)
                | (Options, MainMenu)
                | (GameSolo | GameMulti, Win | Lose | MainMenu)
                | (Win | Lose, MainMenu)
        )
    }

    pub fn is_gameplay(self) -> bool {
        matches!(self, GameState::GameSolo | GameState::GameMulti)
    }

    pub fn is_menu(self) -> bool {
        matches!(
            self,
            GameState::MainMenu | GameState::SoloMenu | GameState::MultiMenu | GameState::Options
        )
    }
}

/// Fixed per-frame update phases for gameplay systems. Chained in this order
/// so input is sampled before motion, and motion before animation.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Motion,
    Animation,
    Collision,
    Scoring,
    Outcome,
    Presentation,
}

/// Run condition: a gameplay state is committed.
pub fn in_gameplay(state: Option<Res<State<GameState>>>) -> bool {
    state.is_some_and(|s| s.get().is_gameplay())
}

/// Chain the gameplay phases. Everything up to scoring stops while paused;
/// outcome and presentation keep running so exit and the pause overlay work.
pub fn configure_game_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Motion,
            GameSet::Animation,
            GameSet::Collision,
            GameSet::Scoring,
            GameSet::Outcome,
            GameSet::Presentation,
        )
            .chain()
            .distributive_run_if(in_gameplay),
    );
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Motion,
            GameSet::Animation,
            GameSet::Collision,
            GameSet::Scoring,
        )
            .distributive_run_if(not_paused),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_edges() {
        assert!(GameState::Start.allows(GameState::MainMenu));
        assert!(GameState::MainMenu.allows(GameState::SoloMenu));
        assert!(GameState::MainMenu.allows(GameState::MultiMenu));
        assert!(GameState::MainMenu.allows(GameState::Options));
        assert!(GameState::MultiMenu.allows(GameState::SoloMenu));
        assert!(GameState::Options.allows(GameState::MainMenu));
    }

    #[test]
    fn gameplay_edges() {
        assert!(GameState::SoloMenu.allows(GameState::GameSolo));
        assert!(GameState::SoloMenu.allows(GameState::GameMulti));
        for from in [GameState::GameSolo, GameState::GameMulti] {
            assert!(from.allows(GameState::Win));
            assert!(from.allows(GameState::Lose));
            assert!(from.allows(GameState::MainMenu));
        }
        assert!(GameState::Win.allows(GameState::MainMenu));
        assert!(GameState::Lose.allows(GameState::MainMenu));
    }

    #[test]
    fn undefined_edges_rejected() {
        assert!(!GameState::Start.allows(GameState::GameSolo));
        assert!(!GameState::MainMenu.allows(GameState::Win));
        assert!(!GameState::Win.allows(GameState::Lose));
        assert!(!GameState::GameSolo.allows(GameState::GameMulti));
        assert!(!GameState::Options.allows(GameState::SoloMenu));
        assert!(!GameState::Loading.allows(GameState::MainMenu));
        assert!(!GameState::MainMenu.allows(GameState::MainMenu));
    }
}
