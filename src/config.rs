//! Tunables loaded from `assets/config/game.json`.

use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, warn};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is not a positive finite number", value),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is not a non-negative finite number", value),
        })
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of a session in seconds.
    pub session_secs: f32,
    /// Rabbits to collect for a win.
    pub collect_target: u32,
    /// Rabbits spawned per session.
    pub rabbit_count: u32,
    /// Player step length per tick at full input.
    pub player_speed: f32,
    /// Rabbit step length per tick.
    pub npc_speed: f32,
    /// Half extent of the square world.
    pub world_bound: f32,
    pub wander_interval_secs: f32,
    pub arrival_radius: f32,
    pub readiness_timeout_secs: f32,
    pub feedback_delay_secs: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session_secs: 60.0,
            collect_target: 10,
            rabbit_count: 10,
            player_speed: 0.15,
            npc_speed: 0.05,
            world_bound: 16.0,
            wander_interval_secs: 10.0,
            arrival_radius: 1.0,
            readiness_timeout_secs: 10.0,
            feedback_delay_secs: 0.25,
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would hang or panic the game, or make a session
    /// unwinnable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("session_secs", self.session_secs)?;
        positive("wander_interval_secs", self.wander_interval_secs)?;
        positive("readiness_timeout_secs", self.readiness_timeout_secs)?;
        positive("world_bound", self.world_bound)?;
        non_negative("feedback_delay_secs", self.feedback_delay_secs)?;
        non_negative("player_speed", self.player_speed)?;
        non_negative("npc_speed", self.npc_speed)?;
        non_negative("arrival_radius", self.arrival_radius)?;
        if self.collect_target == 0 {
            return Err(ConfigError::Invalid {
                field: "collect_target",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.collect_target > self.rabbit_count {
            return Err(ConfigError::Invalid {
                field: "collect_target",
                reason: format!(
                    "{} exceeds rabbit_count {}",
                    self.collect_target, self.rabbit_count
                ),
            });
        }
        Ok(())
    }

    /// Load and validate the config file, falling back to defaults on any
    /// error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::from_path(path) {
            Ok(config) => {
                info!("loaded game config: {:?}", config);
                config
            }
            Err(e) => {
                warn!("using default game config: {}", e);
                Self::default()
            }
        }
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::try_from_secs_f32(self.readiness_timeout_secs).unwrap_or(Duration::ZERO)
    }
}
