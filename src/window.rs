//! Time windows for current-vs-prior comparisons
//!
//! Two modes are supported:
//! - **Rolling**: a trailing window of fixed length ending at "now",
//!   recomputed on every evaluation.
//! - **Calendar**: the week starting Monday 00:00 in the timezone of "now".
//!
//! All windows are half-open `[start, end)`. The prior window always ends
//! exactly where the current one starts, so the two never overlap.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Current window and the equal-length window right before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPair {
    pub current: TimeWindow,
    pub prior: TimeWindow,
}

/// How a report slices time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum WindowMode {
    /// Trailing window ending at "now"
    Rolling {
        #[serde(with = "duration_seconds")]
        length: Duration,
    },

    /// This calendar week vs last calendar week
    Calendar,
}

/// Longest rolling window accepted (roughly a century)
pub const MAX_WINDOW_DAYS: i64 = 36_500;

impl WindowMode {
    /// Rolling mode; the length must be positive and at most [`MAX_WINDOW_DAYS`]
    pub fn rolling(length: Duration) -> Result<Self> {
        if length <= Duration::zero() {
            return Err(ValidationError::new("window_length", "must be positive").into());
        }
        if length > Duration::days(MAX_WINDOW_DAYS) {
            return Err(ValidationError::new(
                "window_length",
                format!("must be at most {} days", MAX_WINDOW_DAYS),
            )
            .into());
        }
        Ok(WindowMode::Rolling { length })
    }

    pub fn rolling_days(days: i64) -> Result<Self> {
        let length = Duration::try_days(days)
            .ok_or_else(|| ValidationError::new("window_length", "out of range"))?;
        Self::rolling(length)
    }
}

/// Trailing window `[now - length, now)`, clamped at the earliest representable instant
pub fn rolling_window(now: DateTime<Utc>, length: Duration) -> TimeWindow {
    TimeWindow::new(saturating_sub(now, length), now)
}

/// Window of the same length immediately before [`rolling_window`]
pub fn prior_window(now: DateTime<Utc>, length: Duration) -> TimeWindow {
    let current = rolling_window(now, length);
    TimeWindow::new(saturating_sub(current.start, length), current.start)
}

fn saturating_sub(instant: DateTime<Utc>, length: Duration) -> DateTime<Utc> {
    instant
        .checked_sub_signed(length)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Calendar week containing `now`, starting Monday 00:00 in `now`'s timezone
pub fn week_window<Tz: TimeZone>(now: &DateTime<Tz>) -> TimeWindow {
    let tz = now.timezone();
    let local_date = now.date_naive();
    let monday =
        local_date - Duration::days(i64::from(local_date.weekday().num_days_from_monday()));
    let midnight = monday.and_time(NaiveTime::MIN);

    // A DST gap can swallow midnight; take the earliest valid instant after it
    let start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));

    TimeWindow::new(start, start + Duration::days(7))
}

/// The calendar week before [`week_window`]
pub fn prior_week<Tz: TimeZone>(now: &DateTime<Tz>) -> TimeWindow {
    let current = week_window(now);
    TimeWindow::new(current.start - Duration::days(7), current.start)
}

/// Current and prior windows for `mode`, evaluated at `now`
pub fn window_pair<Tz: TimeZone>(mode: WindowMode, now: &DateTime<Tz>) -> WindowPair {
    match mode {
        WindowMode::Rolling { length } => {
            let now = now.with_timezone(&Utc);
            WindowPair {
                current: rolling_window(now, length),
                prior: prior_window(now, length),
            }
        }
        WindowMode::Calendar => WindowPair {
            current: week_window(now),
            prior: prior_week(now),
        },
    }
}

mod duration_seconds {
    use chrono::Duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs).ok_or_else(|| D::Error::custom("duration out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_rolling_and_prior_are_contiguous() {
        let now = at(2024, 5, 15, 10);
        let length = Duration::days(7);
        let current = rolling_window(now, length);
        let prior = prior_window(now, length);

        assert_eq!(current.end, now);
        assert_eq!(current.start, now - length);
        assert_eq!(prior.end, current.start);
        assert_eq!(prior.length(), length);
        assert!(!prior.overlaps(&current));
    }

    #[test]
    fn test_half_open_bounds() {
        let now = at(2024, 5, 15, 10);
        let current = rolling_window(now, Duration::days(7));
        assert!(current.contains(current.start));
        assert!(!current.contains(current.end));
    }

    #[test]
    fn test_week_window_starts_monday_midnight() {
        // Wednesday 2024-05-15
        let now = at(2024, 5, 15, 10);
        let week = week_window(&now);
        assert_eq!(week.start, at(2024, 5, 13, 0));
        assert_eq!(week.end, at(2024, 5, 20, 0));

        let prior = prior_week(&now);
        assert_eq!(prior.start, at(2024, 5, 6, 0));
        assert_eq!(prior.end, week.start);
    }

    #[test]
    fn test_week_window_on_monday_midnight_is_that_week() {
        let now = at(2024, 5, 13, 0);
        assert_eq!(week_window(&now).start, now);
    }

    #[test]
    fn test_week_window_respects_timezone() {
        // Monday 01:00 at UTC+3 is still Sunday 22:00 UTC
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 13, 1, 0, 0).unwrap();
        let week = week_window(&now);
        assert_eq!(week.start, at(2024, 5, 12, 21));
        assert!(week.contains(now.with_timezone(&Utc)));
    }

    #[test]
    fn test_rolling_mode_requires_positive_length() {
        assert!(WindowMode::rolling(Duration::zero()).is_err());
        assert!(WindowMode::rolling_days(-1).is_err());
        assert!(WindowMode::rolling_days(7).is_ok());
    }

    #[test]
    fn test_rolling_mode_rejects_oversized_length() {
        assert!(WindowMode::rolling_days(MAX_WINDOW_DAYS).is_ok());

        let err = WindowMode::rolling_days(MAX_WINDOW_DAYS + 1).unwrap_err();
        assert!(err.is_validation());
        assert!(WindowMode::rolling_days(100_000_000).unwrap_err().is_validation());
        assert!(WindowMode::rolling_days(i64::MAX / 1000).unwrap_err().is_validation());
        assert!(WindowMode::rolling(Duration::MAX).is_err());
    }

    #[test]
    fn test_longest_window_near_epoch_does_not_overflow() {
        let now = Utc.timestamp_opt(0, 0).unwrap();
        let WindowMode::Rolling { length } = WindowMode::rolling_days(MAX_WINDOW_DAYS).unwrap()
        else {
            panic!("expected rolling mode");
        };

        let pair = window_pair(WindowMode::Rolling { length }, &now);
        assert_eq!(pair.current.end, now);
        assert_eq!(pair.prior.end, pair.current.start);

        // Subtracting past the earliest instant clamps to it
        let clamped = rolling_window(DateTime::<Utc>::MIN_UTC, Duration::days(1));
        assert_eq!(clamped.start, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_window_pair_calendar() {
        let now = at(2024, 5, 15, 10);
        let pair = window_pair(WindowMode::Calendar, &now);
        assert_eq!(pair.current, week_window(&now));
        assert_eq!(pair.prior.end, pair.current.start);
    }

    proptest! {
        #[test]
        fn prop_prior_window_never_overlaps_current(
            secs in 0i64..4_000_000_000,
            length_secs in 1i64..10_000_000,
        ) {
            let now = Utc.timestamp_opt(secs, 0).unwrap();
            let length = Duration::seconds(length_secs);
            let current = rolling_window(now, length);
            let prior = prior_window(now, length);

            prop_assert_eq!(prior.end, current.start);
            prop_assert!(!prior.overlaps(&current));
            prop_assert_eq!(prior.length(), current.length());
        }

        #[test]
        fn prop_week_window_contains_now(secs in 0i64..4_000_000_000, offset_h in -12i32..=14) {
            let tz = FixedOffset::east_opt(offset_h * 3600).unwrap();
            let now = tz.timestamp_opt(secs, 0).unwrap();
            let week = week_window(&now);

            prop_assert!(week.contains(now.with_timezone(&Utc)));
            prop_assert_eq!(week.length(), Duration::days(7));
            prop_assert_eq!(prior_week(&now).end, week.start);
        }
    }
}
