use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::calendar::{Calendar, same_day};
use crate::models::{Task, Timestamp};

/// Named filters the task list can be shown through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Today,
    Week,
    Upcoming,
    Overdue,
    Goals,
    Recurring,
    Timers,
    All,
}

#[derive(Debug, Error)]
#[error("Unknown view: {0}")]
pub struct UnknownView(pub String);

impl View {
    pub const ALL: [View; 8] = [
        View::Today,
        View::Week,
        View::Upcoming,
        View::Overdue,
        View::Goals,
        View::Recurring,
        View::Timers,
        View::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Today => "today",
            View::Week => "week",
            View::Upcoming => "upcoming",
            View::Overdue => "overdue",
            View::Goals => "goals",
            View::Recurring => "recurring",
            View::Timers => "timers",
            View::All => "all",
        }
    }

    /// Unrecognized names show everything
    pub fn parse_or_all(name: &str) -> View {
        name.parse().unwrap_or(View::All)
    }
}

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == name)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `task` belongs in `view` at instant `now`
pub fn matches(task: &Task, view: View, now: Timestamp, calendar: &Calendar) -> bool {
    match view {
        View::Today => task.due_date.is_some_and(|due| same_day(due, now)),
        View::Week => task
            .due_date
            .is_some_and(|due| calendar.in_same_week(now, due)),
        View::Upcoming => {
            !task.completed && task.due_date.is_some_and(|due| calendar.is_upcoming(now, due))
        }
        View::Overdue => !task.completed && task.due_date.is_some_and(|due| due < now),
        View::Goals => task.is_goal(),
        View::Recurring => task.is_recurring(),
        View::Timers => task.has_timer(),
        View::All => true,
    }
}

/// Select the tasks shown by `view`, dropping completed ones first unless
/// `include_completed` is set. Input order is preserved.
pub fn filter(
    tasks: &[Task],
    view: View,
    include_completed: bool,
    now: Timestamp,
    calendar: &Calendar,
) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| include_completed || !task.completed)
        .filter(|task| matches(task, view, now, calendar))
        .cloned()
        .collect()
}

/// List order: open tasks before completed ones, then dated tasks by due date,
/// then undated tasks newest first.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(display_order);
}

/// Open tasks due inside the upcoming window, soonest first
pub fn upcoming_digest(
    tasks: &[Task],
    now: Timestamp,
    calendar: &Calendar,
    limit: usize,
) -> Vec<Task> {
    let mut upcoming = filter(tasks, View::Upcoming, false, now, calendar);
    sort_for_display(&mut upcoming);
    upcoming.truncate(limit);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekStart;
    use crate::models::RecurrencePattern;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn task(text: &str, due: Option<Timestamp>) -> Task {
        Task::new("u1", text, at(2024, 1, 1, 0)).with_due_date(due)
    }

    fn texts(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.text.as_str()).collect()
    }

    // Wednesday afternoon
    fn now() -> Timestamp {
        at(2024, 1, 10, 12)
    }

    fn sample() -> Vec<Task> {
        let mut done_overdue = task("done overdue", Some(at(2024, 1, 2, 9)));
        done_overdue.completed = true;
        vec![
            task("this morning", Some(at(2024, 1, 10, 8))),
            task("tonight", Some(at(2024, 1, 10, 22))),
            task("saturday", Some(at(2024, 1, 13, 9))),
            task("next tuesday", Some(at(2024, 1, 16, 9))),
            task("in a month", Some(at(2024, 2, 10, 9))),
            task("last week", Some(at(2024, 1, 3, 9))),
            done_overdue,
            task("someday", None),
            task("goal", None).goal(at(2024, 1, 1, 0), at(2024, 2, 1, 0)),
            task("chore", Some(at(2024, 1, 11, 9))).recurring(RecurrencePattern::Daily, 1),
            task("pomodoro", None).timer(25),
        ]
    }

    #[test]
    fn today_matches_the_calendar_day() {
        let result = filter(&sample(), View::Today, true, now(), &Calendar::default());
        assert_eq!(texts(&result), ["this morning", "tonight"]);
    }

    #[test]
    fn week_uses_the_configured_boundary() {
        let sunday = filter(&sample(), View::Week, true, now(), &Calendar::default());
        assert_eq!(texts(&sunday), ["this morning", "tonight", "saturday", "chore"]);

        let monday_cal = Calendar::new(WeekStart::Monday, 7);
        let monday = filter(&sample(), View::Week, true, at(2024, 1, 14, 12), &monday_cal);
        assert_eq!(texts(&monday), ["this morning", "tonight", "saturday", "chore"]);
    }

    #[test]
    fn upcoming_is_strictly_future_within_a_week() {
        let result = filter(&sample(), View::Upcoming, true, now(), &Calendar::default());
        assert_eq!(texts(&result), ["tonight", "saturday", "next tuesday", "chore"]);
    }

    #[test]
    fn overdue_excludes_completed_even_when_included() {
        let result = filter(&sample(), View::Overdue, true, now(), &Calendar::default());
        assert_eq!(texts(&result), ["this morning", "last week"]);
    }

    #[test]
    fn flag_views() {
        let cal = Calendar::default();
        assert_eq!(texts(&filter(&sample(), View::Goals, true, now(), &cal)), ["goal"]);
        assert_eq!(texts(&filter(&sample(), View::Recurring, true, now(), &cal)), ["chore"]);
        assert_eq!(texts(&filter(&sample(), View::Timers, true, now(), &cal)), ["pomodoro"]);
    }

    #[test]
    fn hiding_completed_applies_before_the_view() {
        let cal = Calendar::default();
        assert_eq!(filter(&sample(), View::All, true, now(), &cal).len(), 11);
        assert_eq!(filter(&sample(), View::All, false, now(), &cal).len(), 10);
    }

    #[test]
    fn unknown_view_names_fall_back_to_all() {
        assert_eq!(View::parse_or_all("Overdue"), View::Overdue);
        assert_eq!(View::parse_or_all("calendar"), View::All);
        assert!("calendar".parse::<View>().is_err());
    }

    #[test]
    fn empty_input_is_a_valid_empty_result() {
        assert!(filter(&[], View::Today, false, now(), &Calendar::default()).is_empty());
    }

    #[test]
    fn display_order_groups_and_sorts() {
        let mut a = task("A", Some(at(2024, 1, 1, 0)));
        a.completed = true;
        let b = task("B", Some(at(2024, 1, 20, 0)));
        let b_early = task("B early", Some(at(2024, 1, 5, 0)));
        let mut c_old = task("C old", None);
        c_old.created_at = at(2023, 12, 1, 0);
        let mut c_new = task("C new", None);
        c_new.created_at = at(2023, 12, 20, 0);

        let mut list = vec![a, c_old, b, c_new, b_early];
        sort_for_display(&mut list);
        assert_eq!(texts(&list), ["B early", "B", "C new", "C old", "A"]);
    }

    #[test]
    fn digest_is_sorted_and_limited() {
        let digest = upcoming_digest(&sample(), now(), &Calendar::default(), 2);
        assert_eq!(texts(&digest), ["tonight", "chore"]);
    }
}
