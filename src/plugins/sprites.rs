//! Strip animations for actors.
//!
//! Every actor carries one animation strip per [`MoveState`]. A strip is a
//! single PNG cut into a grid of frames that loops at a fixed interval.
//! Exactly one strip is assigned to the actor's sprite at a time, and it
//! always matches the actor's current move state.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::GameSet;
use crate::components::MoveState;
use crate::plugins::scene_flow::SceneBuilder;

pub struct SpriteAnimationPlugin;

impl Plugin for SpriteAnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (apply_move_state, animate_sprites)
                .chain()
                .after(GameSet::Animation)
                .before(GameSet::Collision),
        );
    }
}

// ---------------------------------------------------------------------------
// Strip layouts
// ---------------------------------------------------------------------------

/// Asset path of the strip for `state` under `prefix`.
pub fn strip_path(prefix: &str, state: MoveState) -> String {
    format!("{}_{}.png", prefix, state.strip_name())
}

/// Grid geometry and frame rate of one strip image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripLayout {
    pub columns: u32,
    pub rows: u32,
    pub frame: UVec2,
    pub interval_secs: f32,
}

impl StripLayout {
    pub fn frames(&self) -> usize {
        (self.columns * self.rows) as usize
    }
}

pub const PLAYER_WATCHING: StripLayout = StripLayout {
    columns: 8,
    rows: 1,
    frame: UVec2::new(64, 64),
    interval_secs: 0.16,
};

pub const PLAYER_WALKING: StripLayout = StripLayout {
    columns: 10,
    rows: 1,
    frame: UVec2::new(64, 64),
    interval_secs: 0.16,
};

pub const RABBIT_WATCHING: StripLayout = StripLayout {
    columns: 6,
    rows: 2,
    frame: UVec2::new(32, 32),
    interval_secs: 0.15,
};

pub const RABBIT_WALKING: StripLayout = StripLayout {
    columns: 4,
    rows: 1,
    frame: UVec2::new(32, 32),
    interval_secs: 0.15,
};

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnimationStrip {
    pub image: Handle<Image>,
    pub layout: Handle<TextureAtlasLayout>,
    pub frames: usize,
    pub interval_secs: f32,
}

/// All strips of one actor, indexed by [`MoveState::index`].
#[derive(Component, Debug, Clone)]
pub struct AnimationSet {
    strips: Vec<AnimationStrip>,
}

impl AnimationSet {
    /// Load `{prefix}_{strip}.png` for every move state.
    pub fn load(
        scene: &mut SceneBuilder,
        prefix: &str,
        watching: StripLayout,
        walking: StripLayout,
    ) -> Self {
        let strips = MoveState::ALL
            .iter()
            .map(|state| {
                let strip = if *state == MoveState::Watching {
                    watching
                } else {
                    walking
                };
                let image = scene.load::<Image>(&strip_path(prefix, *state));
                let layout = scene.add_layout(TextureAtlasLayout::from_grid(
                    strip.frame,
                    strip.columns,
                    strip.rows,
                    None,
                    None,
                ));
                AnimationStrip {
                    image,
                    layout,
                    frames: strip.frames(),
                    interval_secs: strip.interval_secs,
                }
            })
            .collect();
        Self { strips }
    }

    pub fn strip(&self, state: MoveState) -> Option<&AnimationStrip> {
        self.strips.get(state.index())
    }

    /// Sprite showing the first frame of the `state` strip.
    pub fn sprite(&self, state: MoveState, size: Vec2) -> Sprite {
        let mut sprite = Sprite {
            custom_size: Some(size),
            ..default()
        };
        if let Some(strip) = self.strip(state) {
            sprite.image = strip.image.clone();
            sprite.texture_atlas = Some(TextureAtlas {
                layout: strip.layout.clone(),
                index: 0,
            });
        }
        sprite
    }
}

/// Move state whose strip is currently on the sprite.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveStrip(pub MoveState);

/// Timer that controls animation frame rate.
#[derive(Component, Deref, DerefMut)]
pub struct AnimationTimer(pub Timer);

impl AnimationTimer {
    pub fn for_strip(strip: Option<&AnimationStrip>) -> Self {
        let secs = strip.map(|s| s.interval_secs).unwrap_or(0.15);
        Self(Timer::from_seconds(secs, TimerMode::Repeating))
    }
}

/// Everything an animated actor needs besides its transform.
pub fn animated_bundle(set: AnimationSet, size: Vec2) -> impl Bundle {
    let timer = AnimationTimer::for_strip(set.strip(MoveState::Watching));
    (
        set.sprite(MoveState::Watching, size),
        ActiveStrip(MoveState::Watching),
        timer,
        set,
    )
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Swap the sprite to the strip of the actor's new move state.
#[span_fn]
fn apply_move_state(
    mut query: Query<
        (
            &MoveState,
            &AnimationSet,
            &mut ActiveStrip,
            &mut AnimationTimer,
            &mut Sprite,
        ),
        Changed<MoveState>,
    >,
) {
    for (state, set, mut active, mut timer, mut sprite) in &mut query {
        if active.0 == *state {
            continue;
        }
        let Some(strip) = set.strip(*state) else {
            continue;
        };
        active.0 = *state;
        sprite.image = strip.image.clone();
        sprite.texture_atlas = Some(TextureAtlas {
            layout: strip.layout.clone(),
            index: 0,
        });
        timer.0 = Timer::from_seconds(strip.interval_secs, TimerMode::Repeating);
    }
}

/// Advances strip frames, wrapping at the end of the strip.
#[span_fn]
fn animate_sprites(
    time: Res<Time>,
    mut query: Query<(&AnimationSet, &ActiveStrip, &mut AnimationTimer, &mut Sprite)>,
) {
    for (set, active, mut timer, mut sprite) in &mut query {
        timer.tick(time.delta());
        if !timer.just_finished() {
            continue;
        }
        let Some(strip) = set.strip(active.0) else {
            continue;
        };
        let Some(atlas) = &mut sprite.texture_atlas else {
            continue;
        };
        atlas.index = next_frame(atlas.index, strip.frames);
    }
}

pub fn next_frame(index: usize, frames: usize) -> usize {
    if frames == 0 { 0 } else { (index + 1) % frames }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
