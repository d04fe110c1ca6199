//! Termination window parsing
//!
//! Windows are written as a non-negative decimal magnitude followed by a
//! unit suffix: `m` (minutes), `h` (hours) or `d` (days). Fractional values
//! are allowed, e.g. `0.5d` or `1.5h`. Values are normalized to whole
//! seconds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;

/// Errors from parsing a termination window string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("window is empty")]
    Empty,

    #[error("window '{0}' has no unit suffix (expected m, h or d)")]
    MissingUnit(String),

    #[error("window '{input}' has unknown unit '{unit}' (expected m, h or d)")]
    UnknownUnit { input: String, unit: char },

    #[error("window '{0}' is negative")]
    Negative(String),

    #[error("window '{0}' has an invalid magnitude")]
    InvalidMagnitude(String),
}

/// Maximum age a workload may reach before it becomes eligible for termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminationWindow(Duration);

impl TerminationWindow {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::from_secs(minutes * SECS_PER_MINUTE)
    }

    pub fn from_hours(hours: u64) -> Self {
        Self::from_secs(hours * SECS_PER_HOUR)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<TerminationWindow> for Duration {
    fn from(window: TerminationWindow) -> Self {
        window.0
    }
}

impl fmt::Display for TerminationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_window(*self))
    }
}

impl FromStr for TerminationWindow {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_window(s)
    }
}

impl Serialize for TerminationWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_window(*self))
    }
}

impl<'de> Deserialize<'de> for TerminationWindow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_window(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a window string such as `2h`, `0.5d` or `30m`
pub fn parse_window(input: &str) -> Result<TerminationWindow, ParseError> {
    let s = input.trim();
    let Some(unit) = s.chars().last() else {
        return Err(ParseError::Empty);
    };

    if s.starts_with('-') {
        return Err(ParseError::Negative(s.to_string()));
    }

    let unit_secs = match unit {
        'm' => SECS_PER_MINUTE,
        'h' => SECS_PER_HOUR,
        'd' => SECS_PER_DAY,
        c if c.is_ascii_digit() || c == '.' => {
            return Err(ParseError::MissingUnit(s.to_string()));
        }
        other => {
            return Err(ParseError::UnknownUnit {
                input: s.to_string(),
                unit: other,
            });
        }
    };

    let magnitude = &s[..s.len() - unit.len_utf8()];
    if !is_plain_decimal(magnitude) {
        return Err(ParseError::InvalidMagnitude(s.to_string()));
    }

    let value: f64 = magnitude
        .parse()
        .map_err(|_| ParseError::InvalidMagnitude(s.to_string()))?;

    let secs = (value * unit_secs as f64).round();
    if !secs.is_finite() || secs > u64::MAX as f64 {
        return Err(ParseError::InvalidMagnitude(s.to_string()));
    }

    Ok(TerminationWindow::from_secs(secs as u64))
}

/// Canonical textual form of a window; `parse_window` is its inverse.
///
/// Uses the largest unit that divides the value exactly, falling back to
/// fractional hours.
pub fn format_window(window: TerminationWindow) -> String {
    let secs = window.as_secs();
    if secs == 0 {
        return "0h".to_string();
    }

    if secs % SECS_PER_DAY == 0 {
        format!("{}d", secs / SECS_PER_DAY)
    } else if secs % SECS_PER_HOUR == 0 {
        format!("{}h", secs / SECS_PER_HOUR)
    } else if secs % SECS_PER_MINUTE == 0 {
        format!("{}m", secs / SECS_PER_MINUTE)
    } else {
        format!("{}h", secs as f64 / SECS_PER_HOUR as f64)
    }
}

/// Digits with at most one decimal point and at least one digit
fn is_plain_decimal(s: &str) -> bool {
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in s.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}
