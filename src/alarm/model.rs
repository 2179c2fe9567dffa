//! Alarm records and the validated `HH:MM` time they fire at.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier handed out by [`crate::alarm::AlarmStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlarmId(u64);

impl AlarmId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alarm-{}", self.0)
    }
}

/// Error parsing an alarm time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlarmTimeError {
    /// Text was not of the form `HH:MM`.
    #[error("invalid alarm time '{0}': expected HH:MM")]
    Format(String),

    /// Hours or minutes out of range.
    #[error("invalid alarm time '{0}': hours must be 00-23 and minutes 00-59")]
    Range(String),
}

/// A time of day at whole-minute precision, written `HH:MM` (24-hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    /// Build from components, rejecting out-of-range values.
    pub fn new(hour: u8, minute: u8) -> Result<Self, AlarmTimeError> {
        if hour > 23 || minute > 59 {
            return Err(AlarmTimeError::Range(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    /// The minute a wall-clock time falls in.
    #[must_use]
    pub fn from_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Whether `time` falls inside this minute.
    #[must_use]
    pub fn matches(&self, time: NaiveTime) -> bool {
        *self == Self::from_time(time)
    }
}

impl FromStr for AlarmTime {
    type Err = AlarmTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (h, m) = trimmed
            .split_once(':')
            .ok_or_else(|| AlarmTimeError::Format(s.to_string()))?;

        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(h) || !two_digits(m) {
            return Err(AlarmTimeError::Format(s.to_string()));
        }

        let hour: u8 = h.parse().map_err(|_| AlarmTimeError::Format(s.to_string()))?;
        let minute: u8 = m.parse().map_err(|_| AlarmTimeError::Format(s.to_string()))?;
        Self::new(hour, minute).map_err(|_| AlarmTimeError::Range(s.to_string()))
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for AlarmTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AlarmTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A user-defined alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: AlarmTime,
    pub label: String,
    pub is_active: bool,
}
