//! Time utilities for gpu-reaper
//!
//! Ages are computed from cluster creation timestamps, which are UTC wall
//! clock values, so everything here works in `DateTime<Utc>`.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `REAPER_MOCK_TIME` environment variable can be set
//! to override the system time for all age computations. This is useful
//! for exercising termination windows against a live cluster without
//! waiting hours.
//!
//! Format: `YYYY-MM-DD HH:MM:SS`, interpreted as UTC (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! REAPER_MOCK_TIME="2025-12-25 14:30:00" reaperd
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "REAPER_MOCK_TIME";

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached offset between mock time and real time at process start, so mock
/// time keeps advancing.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Internal implementation that wraps Utc::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            match NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT) {
                Ok(naive_dt) => {
                    let offset = naive_dt.and_utc().signed_duration_since(Utc::now());
                    tracing::info!(
                        mock_time = %mock_time_str,
                        offset_secs = offset.num_seconds(),
                        "Mock time enabled"
                    );
                    Some(offset)
                }
                Err(_) => {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = MOCK_TIME_FORMAT,
                        "Invalid mock time format"
                    );
                    None
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current UTC time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // The wrapper that provides mock time support
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();
    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Source of the current time for age computation
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, honouring `REAPER_MOCK_TIME` in debug builds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        now()
    }
}

/// Manually driven clock for tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Elapsed time since `since`, zero if `since` lies in the future
pub fn age_since(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Format a DateTime as RFC 3339 with second precision.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Helper to format durations in human-readable form
///
/// Under an hour prints whole minutes, under a day prints hours with one
/// decimal, otherwise days with one decimal.
pub fn format_duration(d: Duration) -> String {
    let hours = d.as_secs_f64() / 3600.0;
    if hours < 1.0 {
        format!("{} minutes", d.as_secs() / 60)
    } else if hours < 24.0 {
        format!("{:.1} hours", hours)
    } else {
        format!("{:.1} days", hours / 24.0)
    }
}
