//! Audio: forest ambience, per-state music, interface cues, pickups and
//! footsteps on three volume-controlled channels.
//!
//! The boot screen waits for the audio collection to load or fail. Without
//! it every sound is skipped.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope, warn};
use rand::Rng;

use crate::app_state::GameState;
use crate::events::{Cue, Footstep, RabbitCollected, UiCue};
use crate::plugins::scene_flow::HoldBoot;
use crate::resources::{AudioAssets, AudioSettings, AudioTrack};

#[derive(Resource)]
pub struct AmbientChannel;

#[derive(Resource)]
pub struct MusicChannel;

#[derive(Resource)]
pub struct SfxChannel;

/// Progress of the boot-time audio collection.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioLoadState {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Volume reported for a silent channel.
pub const SILENCE_DB: f32 = -60.0;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_audio_channel::<AmbientChannel>()
            .add_audio_channel::<MusicChannel>()
            .add_audio_channel::<SfxChannel>();
        app.init_resource::<AudioSettings>();
        app.init_resource::<NowPlaying>();
        app.init_resource::<FootstepVoices>();

        app.insert_resource(HoldBoot);
        app.init_state::<AudioLoadState>();
        app.add_loading_state(
            LoadingState::new(AudioLoadState::Loading)
                .continue_to_state(AudioLoadState::Ready)
                .on_failure_continue_to_state(AudioLoadState::Failed)
                .load_collection::<AudioAssets>(),
        );
        app.add_systems(
            OnEnter(AudioLoadState::Ready),
            (release_boot, start_ambience),
        );
        app.add_systems(OnEnter(AudioLoadState::Failed), release_boot_silent);

        app.add_systems(OnEnter(GameState::MainMenu), start_menu_music);
        app.add_systems(OnEnter(GameState::GameSolo), start_game_music);
        app.add_systems(OnEnter(GameState::GameMulti), start_game_music);
        app.add_systems(Update, apply_volumes);

        app.add_observer(on_ui_cue);
        app.add_observer(on_rabbit_collected);
        app.add_observer(on_footstep);
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Music {
    Menu,
    Game,
}

/// Music currently looping on the music channel.
#[derive(Resource, Debug, Default)]
struct NowPlaying(Option<Music>);

/// Last footstep instance of each player.
#[derive(Resource, Debug, Default)]
struct FootstepVoices(HashMap<usize, Handle<AudioInstance>>);

/// Channel volume in decibels for a percentage. Zero is silence.
pub fn percent_to_decibels(percent: u8) -> f32 {
    if percent == 0 {
        return SILENCE_DB;
    }
    let amplitude = f32::from(percent.min(100)) / 100.0;
    (20.0 * amplitude.log10()).max(SILENCE_DB)
}

fn amplitude_to_decibels(amplitude: f32) -> f32 {
    (20.0 * amplitude.max(f32::EPSILON).log10()).max(SILENCE_DB)
}

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------

#[span_fn]
fn release_boot(mut commands: Commands) {
    info!("audio loaded");
    commands.remove_resource::<HoldBoot>();
}

#[span_fn]
fn release_boot_silent(mut commands: Commands) {
    warn!("audio failed to load, continuing without sound");
    commands.remove_resource::<HoldBoot>();
}

#[span_fn]
fn start_ambience(
    ambient: Option<Res<AudioChannel<AmbientChannel>>>,
    assets: Option<Res<AudioAssets>>,
) {
    if let (Some(ambient), Some(assets)) = (ambient, assets) {
        ambient.play(assets.forest.clone()).looped();
    }
}

// ---------------------------------------------------------------------------
// Music
// ---------------------------------------------------------------------------

fn switch_music(
    music: Option<Res<AudioChannel<MusicChannel>>>,
    assets: Option<Res<AudioAssets>>,
    now: &mut NowPlaying,
    wanted: Music,
) {
    if now.0 == Some(wanted) {
        return;
    }
    let (Some(music), Some(assets)) = (music, assets) else {
        return;
    };
    music.stop();
    let track = match wanted {
        Music::Menu => assets.menu_music.clone(),
        Music::Game => assets.game_music.clone(),
    };
    music.play(track).looped();
    now.0 = Some(wanted);
}

#[span_fn]
fn start_menu_music(
    music: Option<Res<AudioChannel<MusicChannel>>>,
    assets: Option<Res<AudioAssets>>,
    mut now: ResMut<NowPlaying>,
) {
    switch_music(music, assets, &mut now, Music::Menu);
}

#[span_fn]
fn start_game_music(
    music: Option<Res<AudioChannel<MusicChannel>>>,
    assets: Option<Res<AudioAssets>>,
    mut now: ResMut<NowPlaying>,
) {
    switch_music(music, assets, &mut now, Music::Game);
}

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

fn apply_volumes(
    settings: Res<AudioSettings>,
    ambient: Option<Res<AudioChannel<AmbientChannel>>>,
    music: Option<Res<AudioChannel<MusicChannel>>>,
    sfx: Option<Res<AudioChannel<SfxChannel>>>,
) {
    if !settings.is_changed() {
        return;
    }
    if let Some(ambient) = ambient {
        ambient.set_volume(percent_to_decibels(settings.get(AudioTrack::Ambient)));
    }
    if let Some(music) = music {
        music.set_volume(percent_to_decibels(settings.get(AudioTrack::Music)));
    }
    if let Some(sfx) = sfx {
        sfx.set_volume(percent_to_decibels(settings.get(AudioTrack::Sfx)));
    }
}

// ---------------------------------------------------------------------------
// SFX observers
// ---------------------------------------------------------------------------

#[span_fn]
fn on_ui_cue(
    trigger: On<UiCue>,
    sfx: Option<Res<AudioChannel<SfxChannel>>>,
    assets: Option<Res<AudioAssets>>,
) {
    let (Some(sfx), Some(assets)) = (sfx, assets) else {
        return;
    };
    let sound = match trigger.0 {
        Cue::Confirm => &assets.confirm,
        Cue::Back => &assets.back,
        Cue::Pause => &assets.pause,
        Cue::Unpause => &assets.unpause,
    };
    sfx.play(sound.clone());
}

#[span_fn]
fn on_rabbit_collected(
    _trigger: On<RabbitCollected>,
    sfx: Option<Res<AudioChannel<SfxChannel>>>,
    assets: Option<Res<AudioAssets>>,
) {
    if let (Some(sfx), Some(assets)) = (sfx, assets) {
        sfx.play(assets.collect.clone());
    }
}

/// One footstep per player at a time, each with a slightly different pitch
/// and loudness.
#[span_fn]
fn on_footstep(
    trigger: On<Footstep>,
    sfx: Option<Res<AudioChannel<SfxChannel>>>,
    assets: Option<Res<AudioAssets>>,
    mut voices: ResMut<FootstepVoices>,
) {
    let (Some(sfx), Some(assets)) = (sfx, assets) else {
        return;
    };
    if let Some(handle) = voices.0.get(&trigger.slot) {
        if matches!(sfx.state(handle), PlaybackState::Playing { .. }) {
            return;
        }
    }
    let mut rng = rand::thread_rng();
    let rate: f64 = rng.gen_range(0.9..=1.1);
    let amplitude: f32 = rng.gen_range(0.9..=1.1);
    let handle = sfx
        .play(assets.footstep.clone())
        .with_playback_rate(rate)
        .with_volume(amplitude_to_decibels(amplitude))
        .handle();
    voices.0.insert(trigger.slot, handle);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::AssetPlugin;
    use bevy::state::app::StatesPlugin;
    use bevy_kira_audio::AudioPlugin;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(AssetPlugin::default());
        app.add_plugins(StatesPlugin);
        app.add_plugins(AudioPlugin);
        app.init_state::<GameState>();
        app.add_plugins(GameAudioPlugin);
        app
    }

    #[test]
    fn audio_plugin_initializes() {
        let mut app = setup_app();
        app.update();

        assert!(app.world().get_resource::<AudioChannel<AmbientChannel>>().is_some());
        assert!(app.world().get_resource::<AudioChannel<MusicChannel>>().is_some());
        assert!(app.world().get_resource::<AudioChannel<SfxChannel>>().is_some());
    }

    #[test]
    fn boot_is_held_while_audio_loads() {
        let app = setup_app();
        assert!(app.world().contains_resource::<HoldBoot>());
    }

    #[test]
    fn cues_without_assets_are_skipped() {
        let mut app = setup_app();
        app.update();
        app.world_mut().trigger(UiCue(Cue::Confirm));
        app.world_mut().trigger(Footstep { slot: 0 });
        app.update();
        assert!(app.world().resource::<FootstepVoices>().0.is_empty());
    }

    #[test]
    fn volume_curve() {
        assert_eq!(percent_to_decibels(100), 0.0);
        assert_eq!(percent_to_decibels(0), SILENCE_DB);
        assert!((percent_to_decibels(50) - -6.0206).abs() < 1e-3);
        assert!((percent_to_decibels(10) - -20.0).abs() < 1e-3);
        assert!(percent_to_decibels(1) >= SILENCE_DB);
    }
}
