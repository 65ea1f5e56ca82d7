use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Runtime timings and rule constants shared by every session of a process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Length of one turn before it times out.
    pub turn_duration_ms: u64,
    /// Pause between `turn.ended` and the next `turn.started`.
    pub transition_delay_ms: u64,
    /// Length of one combat round.
    pub combat_round_ms: u64,
    /// How long a finished game's statistics stay readable.
    pub statistics_retention_secs: u64,
    pub actions_per_turn: u32,
    /// Combat wins needed to win a classic game.
    pub wins_to_victory: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            turn_duration_ms: 30_000,
            transition_delay_ms: 3_000,
            combat_round_ms: 5_000,
            statistics_retention_secs: 300,
            actions_per_turn: 1,
            wins_to_victory: 3,
        }
    }
}

impl EngineSettings {
    /// Validate settings values
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.turn_duration_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "turn_duration_ms must be greater than 0".to_string(),
            ));
        }

        if self.combat_round_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "combat_round_ms must be greater than 0".to_string(),
            ));
        }

        if self.statistics_retention_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "statistics_retention_secs must be greater than 0".to_string(),
            ));
        }

        if self.actions_per_turn == 0 {
            return Err(SettingsError::InvalidValue(
                "actions_per_turn must be greater than 0".to_string(),
            ));
        }

        if self.wins_to_victory == 0 {
            return Err(SettingsError::InvalidValue(
                "wins_to_victory must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn turn_duration(&self) -> Duration {
        Duration::from_millis(self.turn_duration_ms)
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn combat_round(&self) -> Duration {
        Duration::from_millis(self.combat_round_ms)
    }

    pub fn statistics_retention(&self) -> Duration {
        Duration::from_secs(self.statistics_retention_secs)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
