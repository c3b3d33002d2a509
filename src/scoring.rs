//! Session tally and countdown, and the outcome they imply.

use bevy::prelude::*;

use crate::app_state::GameState;

/// How a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exit,
    Lose,
    Win,
}

impl Outcome {
    pub fn state(self) -> GameState {
        match self {
            Outcome::Exit => GameState::MainMenu,
            Outcome::Lose => GameState::Lose,
            Outcome::Win => GameState::Win,
        }
    }
}

/// Collected count and remaining time for the running session.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ScoreTracker {
    remaining: f32,
    collected: u32,
    target: u32,
}

impl ScoreTracker {
    pub fn new(session_secs: f32, target: u32) -> Self {
        Self {
            remaining: session_secs,
            collected: 0,
            target,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// Count down by `dt` seconds. The clock is frozen while paused.
    pub fn tick(&mut self, dt: f32, paused: bool) {
        if paused {
            return;
        }
        self.remaining -= dt.max(0.0);
    }

    pub fn record_collection(&mut self) -> u32 {
        self.collected += 1;
        self.collected
    }

    /// Exit wins over everything, then time-out, then a full tally.
    pub fn outcome(&self, exit_requested: bool) -> Option<Outcome> {
        if exit_requested {
            Some(Outcome::Exit)
        } else if self.remaining <= 0.0 {
            Some(Outcome::Lose)
        } else if self.collected == self.target {
            Some(Outcome::Win)
        } else {
            None
        }
    }

    pub fn timer_text(&self) -> String {
        if self.remaining < 0.0 {
            "0".to_string()
        } else {
            format!("{}", self.remaining.round() as i64)
        }
    }

    pub fn counter_text(&self) -> String {
        format!("{} / {}", self.collected, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_is_monotonic_and_frozen_while_paused() {
        let mut tracker = ScoreTracker::new(60.0, 10);
        let mut last = tracker.remaining();
        for i in 0..100 {
            tracker.tick(0.016, i % 3 == 0);
            assert!(tracker.remaining() <= last);
            last = tracker.remaining();
        }
        let frozen = tracker.remaining();
        tracker.tick(5.0, true);
        assert_eq!(tracker.remaining(), frozen);
    }

    #[test]
    fn tally_counts_up() {
        let mut tracker = ScoreTracker::new(60.0, 10);
        assert_eq!(tracker.record_collection(), 1);
        assert_eq!(tracker.record_collection(), 2);
        assert_eq!(tracker.collected(), 2);
    }

    #[test]
    fn win_needs_full_tally_and_time() {
        let mut tracker = ScoreTracker::new(60.0, 2);
        assert_eq!(tracker.outcome(false), None);
        tracker.record_collection();
        assert_eq!(tracker.outcome(false), None);
        tracker.record_collection();
        assert_eq!(tracker.outcome(false), Some(Outcome::Win));
    }

    #[test]
    fn timeout_beats_full_tally_in_same_tick() {
        let mut tracker = ScoreTracker::new(1.0, 1);
        tracker.record_collection();
        tracker.tick(1.0, false);
        assert_eq!(tracker.outcome(false), Some(Outcome::Lose));
    }

    #[test]
    fn exit_beats_everything() {
        let mut tracker = ScoreTracker::new(0.0, 0);
        assert_eq!(tracker.outcome(true), Some(Outcome::Exit));
        tracker.tick(1.0, false);
        assert_eq!(tracker.outcome(true).map(Outcome::state), Some(GameState::MainMenu));
    }

    #[test]
    fn texts() {
        let mut tracker = ScoreTracker::new(60.0, 10);
        assert_eq!(tracker.timer_text(), "60");
        assert_eq!(tracker.counter_text(), "0 / 10");
        tracker.tick(0.6, false);
        assert_eq!(tracker.timer_text(), "59");
        tracker.tick(60.0, false);
        assert_eq!(tracker.timer_text(), "0");
        tracker.record_collection();
        assert_eq!(tracker.counter_text(), "1 / 10");
    }
}
