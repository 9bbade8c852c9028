//! Alarm domain model.
//!
//! # Responsibility
//! - Define the persisted alarm record and its value types.
//! - Derive alarm identity from `(time, sound)`.
//!
//! # Invariants
//! - `AlarmRecord::id` always equals `AlarmId::derive(time, sound)`.
//! - `TimeOfDay` is 24-hour, hour 0-23, minute 0-59, and renders as `HH:MM`.
//! - Decoding rejects records whose stored id disagrees with the derived id.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Validation errors for alarm values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmValidationError {
    /// User-entered time text is not a valid `HH:MM` 24-hour time.
    InvalidTime(String),
    /// Sound key is not one of the bundled assets.
    UnknownSound(String),
    /// Stored id does not match the id derived from time and sound.
    IdMismatch { stored: String, derived: String },
}

impl Display for AlarmValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTime(value) => {
                write!(f, "invalid time `{value}`; expected HH:MM (00:00-23:59)")
            }
            Self::UnknownSound(value) => write!(
                f,
                "unknown alarm sound `{value}`; expected default|beep|chime|ringtone"
            ),
            Self::IdMismatch { stored, derived } => {
                write!(f, "alarm id `{stored}` does not match derived id `{derived}`")
            }
        }
    }
}

impl Error for AlarmValidationError {}

/// Hour and minute of a daily alarm, with no date component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Builds a time of day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, AlarmValidationError> {
        if hour > 23 || minute > 59 {
            return Err(AlarmValidationError::InvalidTime(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Parses user text in `H:MM` or `HH:MM` form.
    ///
    /// Surrounding whitespace is ignored. Any other shape is rejected with the
    /// original input carried in the error.
    pub fn parse(text: &str) -> Result<Self, AlarmValidationError> {
        let invalid = || AlarmValidationError::InvalidTime(text.to_string());
        let trimmed = text.trim();
        let (hour_text, minute_text) = trimmed.split_once(':').ok_or_else(invalid)?;

        let hour_ok = matches!(hour_text.len(), 1 | 2);
        let minute_ok = minute_text.len() == 2;
        let all_digits = hour_text
            .chars()
            .chain(minute_text.chars())
            .all(|c| c.is_ascii_digit());
        if !hour_ok || !minute_ok || !all_digits {
            return Err(invalid());
        }

        let hour = hour_text.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute_text.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }

    /// Takes hour and minute from a wall-clock time, dropping seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        // chrono guarantees hour < 24 and minute < 60.
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = AlarmValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Bundled alarm sound assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmSound {
    #[default]
    Default,
    Beep,
    Chime,
    Ringtone,
}

impl AlarmSound {
    pub const ALL: [AlarmSound; 4] = [Self::Default, Self::Beep, Self::Chime, Self::Ringtone];

    /// Stable asset key used in ids, storage and host commands.
    pub fn key(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Beep => "beep",
            Self::Chime => "chime",
            Self::Ringtone => "ringtone",
        }
    }

    /// Parses an asset key, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, AlarmValidationError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|sound| sound.key() == normalized)
            .ok_or_else(|| AlarmValidationError::UnknownSound(value.to_string()))
    }
}

impl Display for AlarmSound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Alarm identity derived from `(time, sound)`, e.g. `07:30-chime`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(String);

impl AlarmId {
    pub fn derive(time: TimeOfDay, sound: AlarmSound) -> Self {
        Self(format!("{time}-{sound}"))
    }

    /// Wraps an id received from a caller (e.g. a delete request).
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AlarmId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One daily alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AlarmRecordWire")]
pub struct AlarmRecord {
    pub id: AlarmId,
    pub time: TimeOfDay,
    pub sound: AlarmSound,
    /// Handle returned by the platform notification scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

impl AlarmRecord {
    pub fn new(time: TimeOfDay, sound: AlarmSound) -> Self {
        Self {
            id: AlarmId::derive(time, sound),
            time,
            sound,
            notification_id: None,
        }
    }

    /// Checks the id/`(time, sound)` invariant.
    pub fn validate(&self) -> Result<(), AlarmValidationError> {
        let derived = AlarmId::derive(self.time, self.sound);
        if derived != self.id {
            return Err(AlarmValidationError::IdMismatch {
                stored: self.id.to_string(),
                derived: derived.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct AlarmRecordWire {
    id: AlarmId,
    time: TimeOfDay,
    sound: AlarmSound,
    #[serde(default)]
    notification_id: Option<String>,
}

impl TryFrom<AlarmRecordWire> for AlarmRecord {
    type Error = AlarmValidationError;

    fn try_from(wire: AlarmRecordWire) -> Result<Self, Self::Error> {
        let record = Self {
            id: wire.id,
            time: wire.time,
            sound: wire.sound,
            notification_id: wire.notification_id,
        };
        record.validate()?;
        Ok(record)
    }
}
