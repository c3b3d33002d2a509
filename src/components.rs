use bevy::prelude::*;

use crate::app_state::GameState;

// ---------------------------------------------------------------------------
// Scene ownership
// ---------------------------------------------------------------------------

/// Root entity of a built scene. Disposing the scene despawns this entity and
/// every entity tagged [`SceneOwned`] with it.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneRoot {
    pub state: GameState,
}

/// Top-level entity belonging to the scene rooted at `.0`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneOwned(pub Entity);

/// Marker on the one committed scene root.
#[derive(Component, Debug)]
pub struct ActiveScene;

/// Asset handles a pending scene waits on before it may be committed.
#[derive(Component, Debug, Default)]
pub struct SceneWaits(pub Vec<UntypedHandle>);

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A player-controlled actor. `slot` indexes the control scheme and viewport.
#[derive(Component, Debug, Clone, Copy)]
pub struct Player {
    pub slot: usize,
}

#[derive(Component, Debug)]
pub struct Rabbit;

/// Step length per tick at full commitment.
#[derive(Component, Debug, Clone, Copy)]
pub struct MoveSpeed(pub f32);

/// Last computed step, before the world wall is applied.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Discrete facing used to pick the actor's animation strip.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MoveState {
    #[default]
    Watching,
    WalkingUp,
    WalkingDown,
    WalkingLeft,
    WalkingRight,
}

impl MoveState {
    pub const ALL: [MoveState; 5] = [
        MoveState::Watching,
        MoveState::WalkingUp,
        MoveState::WalkingDown,
        MoveState::WalkingLeft,
        MoveState::WalkingRight,
    ];

    pub fn index(self) -> usize {
        match self {
            MoveState::Watching => 0,
            MoveState::WalkingUp => 1,
            MoveState::WalkingDown => 2,
            MoveState::WalkingLeft => 3,
            MoveState::WalkingRight => 4,
        }
    }

    /// File name suffix of the animation strip for this state.
    pub fn strip_name(self) -> &'static str {
        match self {
            MoveState::Watching => "watching",
            MoveState::WalkingUp => "moving_up",
            MoveState::WalkingDown => "moving_down",
            MoveState::WalkingLeft => "moving_left",
            MoveState::WalkingRight => "moving_right",
        }
    }
}

/// Half extents of the actor's bounding box in world units.
#[derive(Component, Debug, Clone, Copy)]
pub struct Hitbox(pub Vec2);

/// One-shot collection flag on a rabbit.
#[derive(Component, Debug, Default)]
pub struct CollectLatch {
    pub triggered: bool,
}

/// Current wander destination of a rabbit and its re-roll timer.
#[derive(Component, Debug)]
pub struct Wander {
    pub destination: Option<Vec2>,
    pub timer: Timer,
}

impl Wander {
    pub fn new(interval_secs: f32) -> Self {
        Self {
            destination: None,
            timer: Timer::from_seconds(interval_secs, TimerMode::Repeating),
        }
    }
}

// ---------------------------------------------------------------------------
// Cameras
// ---------------------------------------------------------------------------

/// World camera that eases toward the player in `slot`.
#[derive(Component, Debug, Clone, Copy)]
pub struct FollowCamera {
    pub slot: usize,
}

/// Camera that renders only the UI layer.
#[derive(Component, Debug)]
pub struct UiCamera;

/// Static world dressing (ground, trees, rocks).
#[derive(Component, Debug)]
pub struct Dressing;
