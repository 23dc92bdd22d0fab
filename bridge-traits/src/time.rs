//! Time Abstractions
//!
//! Provides an injectable time source so seasonal gating can be tested
//! deterministically, plus the log level shared with the runtime logging setup.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time source trait
///
/// Abstracts system time to enable deterministic testing.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn month_day(clock: &dyn Clock) -> String {
///     clock.local_now().format("%m-%d").to_string()
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Current wall-clock time in the host's local timezone.
    ///
    /// Seasonal windows are expressed in calendar days as the user sees them,
    /// so they are evaluated against local time rather than UTC.
    fn local_now(&self) -> NaiveDateTime {
        self.now().with_timezone(&Local).naive_local()
    }

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single local instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    local: NaiveDateTime,
}

impl FixedClock {
    pub fn new(local: NaiveDateTime) -> Self {
        Self { local }
    }

    /// Pin the clock to midnight of the given local calendar day.
    pub fn on_day(year: i32, month: u32, day: u32) -> Option<Self> {
        chrono::NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Local
            .from_local_datetime(&self.local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&self.local))
    }

    fn local_now(&self) -> NaiveDateTime {
        self.local
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now = clock.now();
        let timestamp = clock.unix_timestamp();

        assert!(timestamp > 0);
        assert!(now.timestamp() <= timestamp);
    }

    #[test]
    fn test_fixed_clock_reports_pinned_local_day() {
        let clock = FixedClock::on_day(2024, 12, 15).unwrap();
        assert_eq!(clock.local_now().format("%m-%d").to_string(), "12-15");
    }

    #[test]
    fn test_fixed_clock_rejects_invalid_day() {
        assert!(FixedClock::on_day(2024, 2, 30).is_none());
    }

    #[test]
    fn test_log_level_filter_names() {
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        assert!(LogLevel::Error > LogLevel::Info);
    }
}
