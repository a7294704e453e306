use tracing::{debug, warn};

use crate::calendar;
use crate::models::{RecurrencePattern, Task, Timestamp};

/// Compute the due date of the occurrence that follows `task`.
///
/// Returns `None` when the task is not recurring, has no due date to anchor
/// on, or the shifted date does not fit in the timestamp range.
pub fn next_due_date(task: &Task) -> Option<Timestamp> {
    if !task.is_recurring() {
        return None;
    }
    let due = task.due_date?;
    let interval = task.effective_interval();

    match task.recurrence_pattern.as_ref() {
        Some(RecurrencePattern::Daily) | Some(RecurrencePattern::Custom) => {
            calendar::add_days(due, i64::from(interval))
        }
        Some(RecurrencePattern::Weekly) => calendar::add_weeks(due, interval),
        Some(RecurrencePattern::Monthly) => calendar::add_months(due, interval),
        Some(RecurrencePattern::Other(_)) | None => calendar::add_weeks(due, 1),
    }
}

/// Build the next occurrence of a recurring task that has just been completed.
///
/// The new record copies every field of `task` except for a fresh id, the
/// completion flag, the creation time and the advanced due date.
pub fn next_occurrence(task: &Task, now: Timestamp) -> Option<Task> {
    if !task.is_recurring() || task.due_date.is_none() {
        return None;
    }

    let Some(due) = next_due_date(task) else {
        warn!(task_id = %task.id, "next occurrence falls outside the supported date range");
        return None;
    };

    debug!(task_id = %task.id, next_due = %due, "generated next occurrence");
    Some(Task {
        id: Task::generate_id(),
        completed: false,
        created_at: now,
        due_date: Some(due),
        ..task.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn recurring(pattern: RecurrencePattern, interval: u32, due: Timestamp) -> Task {
        Task::new("u1", "Repeat me", at(2023, 12, 1))
            .with_due_date(Some(due))
            .recurring(pattern, interval)
    }

    #[test]
    fn daily_advances_by_interval_days() {
        let task = recurring(RecurrencePattern::Daily, 3, at(2024, 1, 1));
        let next = next_occurrence(&task, at(2024, 1, 1)).unwrap();
        assert_eq!(next.due_date, Some(at(2024, 1, 4)));
        assert!(!next.completed);
        assert_eq!(next.recurrence_pattern, Some(RecurrencePattern::Daily));
        assert_eq!(next.recurrence_interval, Some(3));
    }

    #[test]
    fn weekly_advances_by_interval_weeks() {
        let task = recurring(RecurrencePattern::Weekly, 2, at(2024, 1, 1));
        assert_eq!(next_due_date(&task), Some(at(2024, 1, 15)));
    }

    #[test]
    fn custom_counts_days() {
        let task = recurring(RecurrencePattern::Custom, 10, at(2024, 1, 1));
        assert_eq!(next_due_date(&task), Some(at(2024, 1, 11)));
    }

    #[test]
    fn monthly_clamps_to_the_end_of_shorter_months() {
        let task = recurring(RecurrencePattern::Monthly, 1, at(2024, 1, 31));
        assert_eq!(next_due_date(&task), Some(at(2024, 2, 29)));

        let task = recurring(RecurrencePattern::Monthly, 3, at(2024, 1, 15));
        assert_eq!(next_due_date(&task), Some(at(2024, 4, 15)));
    }

    #[test]
    fn unknown_pattern_recurs_weekly_regardless_of_interval() {
        let task = recurring(RecurrencePattern::Other("yearly".into()), 5, at(2024, 1, 1));
        assert_eq!(next_due_date(&task), Some(at(2024, 1, 8)));

        let mut task = recurring(RecurrencePattern::Daily, 1, at(2024, 1, 1));
        task.recurrence_pattern = None;
        assert_eq!(next_due_date(&task), Some(at(2024, 1, 8)));
    }

    #[test]
    fn invalid_interval_uses_one() {
        let mut task = recurring(RecurrencePattern::Daily, 1, at(2024, 1, 1));
        task.recurrence_interval = Some(-2);
        assert_eq!(next_due_date(&task), Some(at(2024, 1, 2)));
        task.recurrence_interval = None;
        assert_eq!(next_due_date(&task), Some(at(2024, 1, 2)));
    }

    #[test]
    fn copies_everything_else_verbatim() {
        let mut task = recurring(RecurrencePattern::Daily, 1, at(2024, 1, 1))
            .goal(at(2024, 1, 1), at(2024, 2, 1))
            .timer(25);
        task.category = Some("health".into());
        task.completed = true;

        let next = next_occurrence(&task, at(2024, 1, 1)).unwrap();
        assert_ne!(next.id, task.id);
        assert_eq!(next.created_at, at(2024, 1, 1));
        assert_eq!(next.text, task.text);
        assert_eq!(next.user_id, task.user_id);
        assert_eq!(next.category, task.category);
        assert_eq!(next.goal_end_date, task.goal_end_date);
        assert_eq!(next.timer_duration, Some(25));
    }

    #[test]
    fn requires_a_recurring_task_with_a_due_date() {
        let plain = Task::new("u1", "once", at(2024, 1, 1)).with_due_date(Some(at(2024, 1, 2)));
        assert!(next_occurrence(&plain, at(2024, 1, 1)).is_none());

        let undated = recurring(RecurrencePattern::Daily, 1, at(2024, 1, 1)).with_due_date(None);
        assert!(next_occurrence(&undated, at(2024, 1, 1)).is_none());
    }
}
