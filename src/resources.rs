use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::AudioSource;

use crate::app_state::GameState;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Flags shared by every gameplay system for one session.
///
/// Reset on entering the main menu. Actors, dressing and the HUD live in the
/// gameplay scene and go away with it; the tally lives in
/// [`ScoreTracker`](crate::scoring::ScoreTracker).
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub player_count: u8,
    pub paused: bool,
    pub exit_requested: bool,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            player_count: 1,
            paused: false,
            exit_requested: false,
        }
    }
}

impl SessionStatus {
    /// Gameplay state matching the number of players.
    pub fn gameplay_state(&self) -> GameState {
        if self.player_count >= 2 {
            GameState::GameMulti
        } else {
            GameState::GameSolo
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

/// Run condition: the session is not paused. Missing session counts as running.
pub fn not_paused(session: Option<Res<SessionStatus>>) -> bool {
    session.is_none_or(|s| !s.paused)
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

pub const VOLUME_STEP: u8 = 10;

/// Channel volumes in percent, edited from the options screen.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSettings {
    pub ambient: u8,
    pub music: u8,
    pub sfx: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            ambient: 100,
            music: 100,
            sfx: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTrack {
    Ambient,
    Music,
    Sfx,
}

impl AudioSettings {
    pub fn get(&self, track: AudioTrack) -> u8 {
        match track {
            AudioTrack::Ambient => self.ambient,
            AudioTrack::Music => self.music,
            AudioTrack::Sfx => self.sfx,
        }
    }

    /// Move a channel volume by `delta` percent, clamped to 0..=100.
    pub fn adjust(&mut self, track: AudioTrack, delta: i16) -> u8 {
        let slot = match track {
            AudioTrack::Ambient => &mut self.ambient,
            AudioTrack::Music => &mut self.music,
            AudioTrack::Sfx => &mut self.sfx,
        };
        *slot = (*slot as i16 + delta).clamp(0, 100) as u8;
        *slot
    }
}

#[derive(AssetCollection, Resource)]
pub struct AudioAssets {
    #[asset(path = "audio/ambient/forest.ogg")]
    pub forest: Handle<AudioSource>,
    #[asset(path = "audio/music/menu.ogg")]
    pub menu_music: Handle<AudioSource>,
    #[asset(path = "audio/music/game.ogg")]
    pub game_music: Handle<AudioSource>,
    #[asset(path = "audio/sfx/confirm.ogg")]
    pub confirm: Handle<AudioSource>,
    #[asset(path = "audio/sfx/back.ogg")]
    pub back: Handle<AudioSource>,
    #[asset(path = "audio/sfx/pause.ogg")]
    pub pause: Handle<AudioSource>,
    #[asset(path = "audio/sfx/unpause.ogg")]
    pub unpause: Handle<AudioSource>,
    #[asset(path = "audio/sfx/collect.ogg")]
    pub collect: Handle<AudioSource>,
    #[asset(path = "audio/sfx/step_grass.ogg")]
    pub footstep: Handle<AudioSource>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
