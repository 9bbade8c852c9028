//! Core runtime configuration.
//!
//! # Responsibility
//! - Hold tunables for the scheduler and puzzle generation.
//! - Parse host-provided JSON with per-field defaults.
//!
//! # Invariants
//! - A validated config has non-zero durations and lengths and at least one
//!   puzzle kind.

use crate::puzzle::challenge::{ChallengeSettings, PuzzleKind};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Delay between a snooze and the alarm ringing again.
    pub snooze_delay_secs: u32,
    /// How long a memory sequence stays visible after the gate is started.
    pub memory_reveal_secs: u32,
    pub color_sequence_len: usize,
    pub retype_len: usize,
    /// Loop alarm audio until stop/snooze. When off, playback completion
    /// ends the ring.
    pub loop_audio: bool,
    /// Key the triggered set by calendar day so alarms fire once per day.
    /// When off, an alarm fires at most once per process.
    pub rearm_daily: bool,
    pub puzzle_kinds: Vec<PuzzleKind>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            snooze_delay_secs: 5,
            memory_reveal_secs: 5,
            color_sequence_len: 4,
            retype_len: 10,
            loop_audio: true,
            rearm_daily: true,
            puzzle_kinds: PuzzleKind::ALL.to_vec(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates host JSON. Blank input yields the defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snooze_delay_secs == 0 {
            return Err(ConfigError::Invalid("snooze_delay_secs must be > 0".into()));
        }
        if self.memory_reveal_secs == 0 {
            return Err(ConfigError::Invalid("memory_reveal_secs must be > 0".into()));
        }
        if self.color_sequence_len == 0 {
            return Err(ConfigError::Invalid("color_sequence_len must be > 0".into()));
        }
        if self.retype_len == 0 {
            return Err(ConfigError::Invalid("retype_len must be > 0".into()));
        }
        if self.puzzle_kinds.is_empty() {
            return Err(ConfigError::Invalid("puzzle_kinds cannot be empty".into()));
        }
        Ok(())
    }

    pub fn snooze_delay(&self) -> Duration {
        Duration::seconds(i64::from(self.snooze_delay_secs))
    }

    pub fn memory_reveal(&self) -> Duration {
        Duration::seconds(i64::from(self.memory_reveal_secs))
    }

    pub fn challenge_settings(&self) -> ChallengeSettings {
        ChallengeSettings {
            color_sequence_len: self.color_sequence_len,
            retype_len: self.retype_len,
        }
    }
}
