//! Game events triggered by gameplay and UI systems and observed by the HUD and audio.

use bevy::prelude::*;

/// A rabbit was touched by the player in `slot`.
#[derive(Event, Debug, Clone, Copy)]
pub struct RabbitCollected {
    pub rabbit: Entity,
    pub slot: usize,
}

/// The player in `slot` moved this tick.
#[derive(Event, Debug, Clone, Copy)]
pub struct Footstep {
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Confirm,
    Back,
    Pause,
    Unpause,
}

/// One-off interface sound.
#[derive(Event, Debug, Clone, Copy)]
pub struct UiCue(pub Cue);
