//! Wall-clock time of day and its "HH:MM" display form

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure to read an "HH:MM" display string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseTimeError {
    #[error("missing ':' separator")]
    MissingSeparator,

    #[error("more than one ':' separator")]
    TooManySeparators,

    #[error("hour is not a number: {0:?}")]
    InvalidHour(String),

    #[error("minute is not a number: {0:?}")]
    InvalidMinute(String),
}

/// An hour/minute pair as entered on an alarm or read off the clock.
///
/// Components are not range checked; `25:99` is representable so that
/// display strings survive a parse/format round trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Minutes elapsed since midnight, `[0, 1439]` for in-range components
    pub fn minutes_since_midnight(self) -> u32 {
        self.hour.saturating_mul(60).saturating_add(self.minute)
    }

    /// Whether both components are a real clock reading
    pub fn is_valid(self) -> bool {
        self.hour < 24 && self.minute < 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time(s)
    }
}

/// Parse an "HH:MM" string into its components.
///
/// Exactly one `:` is required and both sides must be base-10 integers.
/// Width is not enforced, so `"8:5"` parses to 08:05.
pub fn parse_time(display: &str) -> Result<TimeOfDay, ParseTimeError> {
    let mut parts = display.split(':');
    let (hour, minute) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), None) => (h, m),
        (_, None, _) => return Err(ParseTimeError::MissingSeparator),
        _ => return Err(ParseTimeError::TooManySeparators),
    };

    let hour = hour
        .parse::<u32>()
        .map_err(|_| ParseTimeError::InvalidHour(hour.to_string()))?;
    let minute = minute
        .parse::<u32>()
        .map_err(|_| ParseTimeError::InvalidMinute(minute.to_string()))?;

    Ok(TimeOfDay { hour, minute })
}

/// Zero-pad both components to width 2 and join them with `:`.
///
/// No range validation: `format_time(25, 99)` is `"25:99"`.
pub fn format_time(hour: u32, minute: u32) -> String {
    TimeOfDay::new(hour, minute).to_string()
}
