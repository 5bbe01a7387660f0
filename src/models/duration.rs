//! Race duration codec
//!
//! Durations travel as `HH:MM:SS.CC` (centiseconds). The sentinel `--`
//! stands for a zero duration, i.e. an entry that has not finished.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::UNSET_DISPLAY;

const NANOS_PER_CENTI: u128 = 10_000_000;
const CENTIS_PER_SECOND: u64 = 100;
const CENTIS_PER_MINUTE: u64 = 60 * CENTIS_PER_SECOND;
const CENTIS_PER_HOUR: u64 = 60 * CENTIS_PER_MINUTE;

/// Elapsed time since the race started. Zero means "not yet finished".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RaceDuration(Duration);

impl RaceDuration {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_centis(centis: u64) -> Self {
        let nanos = (centis % CENTIS_PER_SECOND) as u32 * NANOS_PER_CENTI as u32;
        Self(Duration::new(centis / CENTIS_PER_SECOND, nanos))
    }

    /// Convert a signed chrono delta, clamping negative values to zero.
    pub fn from_delta(delta: chrono::TimeDelta) -> Self {
        Self(delta.to_std().unwrap_or(Duration::ZERO))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_std(&self) -> Duration {
        self.0
    }

    pub fn as_delta(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::from_std(self.0).unwrap_or(chrono::TimeDelta::MAX)
    }

    /// Drop everything below one centisecond.
    pub fn truncate_to_centis(self) -> Self {
        let nanos = self.0.subsec_nanos() / NANOS_PER_CENTI as u32 * NANOS_PER_CENTI as u32;
        Self(Duration::new(self.0.as_secs(), nanos))
    }

    fn rounded_centis(&self) -> u64 {
        ((self.0.as_nanos() + NANOS_PER_CENTI / 2) / NANOS_PER_CENTI) as u64
    }

    /// Wall-clock style `HH:MM:SS`, used by the heartbeat and status views.
    pub fn clock(&self) -> String {
        if self.is_zero() {
            return UNSET_DISPLAY.to_string();
        }
        let secs = self.0.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
    }
}

impl From<Duration> for RaceDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl fmt::Display for RaceDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str(UNSET_DISPLAY);
        }
        let centis = self.rounded_centis();
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            centis / CENTIS_PER_HOUR,
            centis % CENTIS_PER_HOUR / CENTIS_PER_MINUTE,
            centis % CENTIS_PER_MINUTE / CENTIS_PER_SECOND,
            centis % CENTIS_PER_SECOND
        )
    }
}

/// The part of a duration string that failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationComponent {
    Hours,
    Minutes,
    Seconds,
    Centiseconds,
}

impl fmt::Display for DurationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours => write!(f, "hours"),
            Self::Minutes => write!(f, "minutes"),
            Self::Seconds => write!(f, "seconds"),
            Self::Centiseconds => write!(f, "centiseconds"),
        }
    }
}

/// Duration parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("`{input}` is not a valid race duration, expected HH:MM:SS.CC")]
    FieldCount { input: String },

    #[error("`{input}` does not contain a valid seconds field, expected SS.CC")]
    MissingFraction { input: String },

    #[error("invalid {component} `{value}` in race duration")]
    Component {
        component: DurationComponent,
        value: String,
    },
}

fn parse_component(value: &str, component: DurationComponent, limit: Option<u64>) -> Result<u64, FormatError> {
    let invalid = || FormatError::Component {
        component,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let parsed: u64 = value.parse().map_err(|_| invalid())?;
    match limit {
        Some(max) if parsed >= max => Err(invalid()),
        _ => Ok(parsed),
    }
}

impl FromStr for RaceDuration {
    type Err = FormatError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == UNSET_DISPLAY {
            return Ok(Self::ZERO);
        }

        let fields: Vec<&str> = trimmed.split(':').collect();
        let [hours, minutes, seconds] = fields.as_slice() else {
            return Err(FormatError::FieldCount {
                input: input.to_string(),
            });
        };
        let Some((whole, fraction)) = seconds.split_once('.') else {
            return Err(FormatError::MissingFraction {
                input: input.to_string(),
            });
        };

        let hours = parse_component(hours, DurationComponent::Hours, None)?;
        let minutes = parse_component(minutes, DurationComponent::Minutes, Some(60))?;
        let seconds = parse_component(whole, DurationComponent::Seconds, Some(60))?;
        if fraction.len() > 2 {
            return Err(FormatError::Component {
                component: DurationComponent::Centiseconds,
                value: fraction.to_string(),
            });
        }
        let centis = parse_component(fraction, DurationComponent::Centiseconds, Some(100))?;

        let total = hours
            .checked_mul(CENTIS_PER_HOUR)
            .and_then(|total| total.checked_add(minutes * CENTIS_PER_MINUTE + seconds * CENTIS_PER_SECOND + centis))
            .ok_or_else(|| FormatError::Component {
                component: DurationComponent::Hours,
                value: hours.to_string(),
            })?;
        Ok(Self::from_centis(total))
    }
}

impl Serialize for RaceDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RaceDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
