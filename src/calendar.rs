//! Day, week and month arithmetic shared by the views, statistics and
//! recurrence code. All calendar boundaries are taken in UTC.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::models::Timestamp;

/// First day of the week used for every "this week" computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub week_start: WeekStart,
    /// How far ahead a due date still counts as upcoming
    pub upcoming_window_days: i64,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Sunday,
            upcoming_window_days: 7,
        }
    }
}

impl Calendar {
    pub fn new(week_start: WeekStart, upcoming_window_days: i64) -> Self {
        Self {
            week_start,
            upcoming_window_days: upcoming_window_days.max(0),
        }
    }

    /// First calendar day of the week containing `at`
    pub fn week_start_date(&self, at: Timestamp) -> NaiveDate {
        let date = at.date_naive();
        let offset = match self.week_start {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        date.checked_sub_days(Days::new(u64::from(offset)))
            .unwrap_or(date)
    }

    /// Half-open `[start, end)` bounds of the week containing `at`
    pub fn week_bounds(&self, at: Timestamp) -> (Timestamp, Timestamp) {
        let start = start_of_day_for(self.week_start_date(at));
        let end = add_days(start, 7).unwrap_or(Timestamp::MAX_UTC);
        (start, end)
    }

    pub fn in_same_week(&self, at: Timestamp, candidate: Timestamp) -> bool {
        let (start, end) = self.week_bounds(at);
        start <= candidate && candidate < end
    }

    /// The seven dates of the week containing `at`, in order
    pub fn week_days(&self, at: Timestamp) -> Vec<NaiveDate> {
        self.week_start_date(at)
            .iter_days()
            .take(7)
            .collect()
    }

    /// `now < due <= now + window`
    pub fn is_upcoming(&self, now: Timestamp, due: Timestamp) -> bool {
        let horizon = add_days(now, self.upcoming_window_days).unwrap_or(Timestamp::MAX_UTC);
        now < due && due <= horizon
    }
}

pub fn start_of_day(at: Timestamp) -> Timestamp {
    start_of_day_for(at.date_naive())
}

fn start_of_day_for(date: NaiveDate) -> Timestamp {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn same_day(a: Timestamp, b: Timestamp) -> bool {
    a.date_naive() == b.date_naive()
}

/// Whole days from `from` to `to`, truncated toward zero
pub fn days_between(from: Timestamp, to: Timestamp) -> i64 {
    (to - from).num_days()
}

pub fn add_days(at: Timestamp, days: i64) -> Option<Timestamp> {
    TimeDelta::try_days(days).and_then(|delta| at.checked_add_signed(delta))
}

pub fn add_weeks(at: Timestamp, weeks: u32) -> Option<Timestamp> {
    add_days(at, i64::from(weeks) * 7)
}

/// Calendar month addition; a day that does not exist in the target month is
/// clamped to that month's last day.
pub fn add_months(at: Timestamp, months: u32) -> Option<Timestamp> {
    at.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn week_bounds_follow_the_configured_start_day() {
        // 2024-01-03 is a Wednesday
        let wed = at(2024, 1, 3, 15);
        let sunday = Calendar::default();
        assert_eq!(sunday.week_bounds(wed), (at(2023, 12, 31, 0), at(2024, 1, 7, 0)));

        let monday = Calendar::new(WeekStart::Monday, 7);
        assert_eq!(monday.week_bounds(wed), (at(2024, 1, 1, 0), at(2024, 1, 8, 0)));
        assert!(monday.in_same_week(wed, at(2024, 1, 7, 23)));
        assert!(!monday.in_same_week(wed, at(2024, 1, 8, 0)));
    }

    #[test]
    fn week_days_lists_seven_dates() {
        let days = Calendar::default().week_days(at(2024, 1, 3, 0));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
    }

    #[test]
    fn days_between_truncates_partial_days() {
        assert_eq!(days_between(at(2024, 1, 1, 0), at(2024, 1, 11, 0)), 10);
        assert_eq!(days_between(at(2024, 1, 1, 0), at(2024, 1, 2, 23)), 1);
        assert_eq!(days_between(at(2024, 1, 2, 0), at(2024, 1, 1, 1)), 0);
    }

    #[test]
    fn month_addition_clamps_to_month_end() {
        assert_eq!(add_months(at(2024, 1, 31, 9), 1), Some(at(2024, 2, 29, 9)));
        assert_eq!(add_months(at(2023, 1, 31, 9), 1), Some(at(2023, 2, 28, 9)));
        assert_eq!(add_months(at(2024, 1, 15, 9), 12), Some(at(2025, 1, 15, 9)));
    }

    #[test]
    fn upcoming_window_is_exclusive_of_now_and_inclusive_of_horizon() {
        let cal = Calendar::default();
        let now = at(2024, 1, 1, 12);
        assert!(!cal.is_upcoming(now, now));
        assert!(cal.is_upcoming(now, at(2024, 1, 8, 12)));
        assert!(!cal.is_upcoming(now, at(2024, 1, 8, 13)));
    }

    #[test]
    fn oversized_additions_report_overflow() {
        assert_eq!(add_days(at(2024, 1, 1, 0), i64::MAX), None);
    }
}
