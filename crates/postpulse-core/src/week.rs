//! Weekly tracking periods.
//!
//! A tracking week opens at 03:00 UTC on Friday and lasts exactly seven days.
//! During the first three hours of a Friday the previous week is still open.
//!
//! Week indexes count whole weeks since the reference week that opened on
//! 2024-01-05T03:00:00Z (index `0`). The dashboard filter and the sync
//! pipeline must both stamp records through [`week_index`]; any divergence
//! makes freshly synced posts disappear from the default view.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Timelike, Utc};
use serde::Serialize;

/// Hour (UTC) at which a new week opens on Friday.
pub const WEEK_START_HOUR_UTC: u32 = 3;

/// `2024-01-05T03:00:00Z`, the opening instant of week index `0`.
const EPOCH_WEEK_START_SECS: i64 = 1_704_423_600;

const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

/// `chrono` numbers Friday as day 5 counting from Sunday.
const FRIDAY_FROM_SUNDAY: u32 = 5;

/// Start, end and display label of one tracking week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekBoundaries {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Human label such as `"Jan 5 - Jan 12"`.
    pub label: String,
}

impl WeekBoundaries {
    fn from_start(start: DateTime<Utc>) -> Self {
        let end = start + TimeDelta::days(7);
        let label = format!("{} - {}", start.format("%b %-d"), end.format("%b %-d"));
        Self { start, end, label }
    }

    /// Returns `true` if `instant` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Returns the Friday 03:00 UTC instant that opened the week containing `instant`.
#[must_use]
pub fn week_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let weekday = instant.weekday().num_days_from_sunday();
    let mut days_back = (weekday + 7 - FRIDAY_FROM_SUNDAY) % 7;
    if days_back == 0 && instant.hour() < WEEK_START_HOUR_UTC {
        days_back = 7;
    }

    let date = instant.date_naive() - TimeDelta::days(i64::from(days_back));
    (date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(WEEK_START_HOUR_UTC))).and_utc()
}

/// Returns the boundaries of the week containing `instant`.
#[must_use]
pub fn week_boundaries(instant: DateTime<Utc>) -> WeekBoundaries {
    WeekBoundaries::from_start(week_start(instant))
}

/// Returns the week index of `instant`.
///
/// Floor division keeps instants before the reference week negative rather
/// than rounding them toward zero.
#[must_use]
pub fn week_index(instant: DateTime<Utc>) -> i32 {
    let elapsed = week_start(instant).timestamp() - EPOCH_WEEK_START_SECS;
    saturate_i32(elapsed.div_euclid(SECONDS_PER_WEEK))
}

/// Returns the boundaries of an arbitrary week index.
#[must_use]
pub fn week_boundaries_for_index(index: i32) -> WeekBoundaries {
    let start_secs = EPOCH_WEEK_START_SECS + i64::from(index) * SECONDS_PER_WEEK;
    let start = DateTime::from_timestamp(start_secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
    WeekBoundaries::from_start(start)
}

/// Merges the stored week indexes with the current week, newest first.
#[must_use]
pub fn available_weeks(current: i32, stored: &[i32]) -> Vec<i32> {
    let mut weeks: Vec<i32> = stored.to_vec();
    weeks.push(current);
    weeks.sort_unstable_by(|a, b| b.cmp(a));
    weeks.dedup();
    weeks
}

fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn friday_after_three_opens_the_same_day() {
        let b = week_boundaries(at("2024-03-01T03:00:00Z"));
        assert_eq!(b.start, at("2024-03-01T03:00:00Z"));
        assert_eq!(b.end, at("2024-03-08T03:00:00Z"));
    }

    #[test]
    fn friday_before_three_belongs_to_previous_week() {
        let b = week_boundaries(at("2024-03-01T02:59:59Z"));
        assert_eq!(b.start, at("2024-02-23T03:00:00Z"));
    }

    #[test]
    fn start_is_constant_across_the_whole_interval() {
        let expected = at("2024-03-01T03:00:00Z");
        let samples = [
            "2024-03-01T03:00:00Z",
            "2024-03-01T23:59:59Z",
            "2024-03-02T12:00:00Z",
            "2024-03-03T00:00:00Z",
            "2024-03-05T18:30:00Z",
            "2024-03-07T23:59:59Z",
            "2024-03-08T00:00:00Z",
            "2024-03-08T02:59:59Z",
        ];
        for s in samples {
            assert_eq!(week_start(at(s)), expected, "sample {s}");
        }
        assert_eq!(week_start(at("2024-03-08T03:00:00Z")), at("2024-03-08T03:00:00Z"));
    }

    #[test]
    fn end_is_exactly_seven_days_after_start() {
        let b = week_boundaries(at("2024-07-17T09:15:00Z"));
        assert_eq!(b.end - b.start, TimeDelta::days(7));
        assert!(b.contains(at("2024-07-17T09:15:00Z")));
        assert!(!b.contains(b.end));
    }

    #[test]
    fn reference_week_has_index_zero() {
        assert_eq!(week_index(at("2024-01-05T03:00:00Z")), 0);
        assert_eq!(week_index(at("2024-01-12T02:59:59Z")), 0);
        assert_eq!(week_index(at("2024-01-12T03:00:00Z")), 1);
        assert_eq!(week_index(at("2024-03-01T12:00:00Z")), 8);
        assert_eq!(week_index(at("2026-10-16T03:00:00Z")), 145);
    }

    #[test]
    fn instants_before_reference_week_floor_to_negative() {
        assert_eq!(week_index(at("2024-01-05T02:59:59Z")), -1);
        assert_eq!(week_index(at("2023-12-29T03:00:00Z")), -1);
        assert_eq!(week_index(at("2023-12-29T02:00:00Z")), -2);
    }

    #[test]
    fn index_of_start_matches_index_of_instant() {
        let samples = [
            "2023-06-01T00:00:00Z",
            "2024-01-05T02:59:59Z",
            "2024-02-29T13:00:00Z",
            "2025-12-31T23:59:59Z",
            "2026-10-15T08:00:00Z",
        ];
        for s in samples {
            let t = at(s);
            assert_eq!(week_index(week_boundaries(t).start), week_index(t), "sample {s}");
        }
    }

    #[test]
    fn boundaries_for_index_round_trip_with_week_index() {
        let b = week_boundaries_for_index(8);
        assert_eq!(b.start, at("2024-03-01T03:00:00Z"));
        assert_eq!(week_index(b.start), 8);

        let before = week_boundaries_for_index(-1);
        assert_eq!(before.start, at("2023-12-29T03:00:00Z"));
    }

    #[test]
    fn label_uses_short_month_and_day() {
        let b = week_boundaries(at("2024-01-06T00:00:00Z"));
        assert_eq!(b.label, "Jan 5 - Jan 12");

        let b = week_boundaries(at("2024-02-27T00:00:00Z"));
        assert_eq!(b.label, "Feb 23 - Mar 1");
    }

    #[test]
    fn available_weeks_adds_current_and_sorts_descending() {
        assert_eq!(available_weeks(10, &[8, 9]), vec![10, 9, 8]);
        assert_eq!(available_weeks(10, &[10, 9, 10]), vec![10, 9]);
        assert_eq!(available_weeks(3, &[]), vec![3]);
    }
}
