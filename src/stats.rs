use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{self, Calendar};
use crate::models::{Task, TaskStats, Timestamp};

/// Four independent counts; a task with several flags is counted once per flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TypeDistribution {
    pub regular: usize,
    pub goals: usize,
    pub recurring: usize,
    pub timers: usize,
}

impl TypeDistribution {
    pub fn total(&self) -> usize {
        self.regular + self.goals + self.recurring + self.timers
    }
}

/// One bar of the weekly completion histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub summary: TaskStats,
    pub distribution: TypeDistribution,
    pub week: Vec<DayCount>,
}

impl StatsReport {
    /// Build the full statistics page for the week `week_offset` weeks away
    /// from the current one.
    pub fn build(tasks: &[Task], now: Timestamp, calendar: &Calendar, week_offset: i64) -> Self {
        let anchor = week_offset
            .checked_mul(7)
            .and_then(|days| calendar::add_days(now, days))
            .unwrap_or(now);
        Self {
            summary: stats(tasks, now, calendar),
            distribution: type_distribution(tasks),
            week: weekly_completions(tasks, anchor, calendar),
        }
    }

    /// Scale for histogram bars, at least 1
    pub fn busiest_day(&self) -> usize {
        self.week.iter().map(|day| day.count).max().unwrap_or(0).max(1)
    }
}

pub fn stats(tasks: &[Task], now: Timestamp, calendar: &Calendar) -> TaskStats {
    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.completed).count();
    let overdue_tasks = tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.is_some_and(|due| due < now))
        .count();
    let upcoming_tasks = tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.is_some_and(|due| calendar.is_upcoming(now, due)))
        .count();
    // Measured on createdAt: completion time is not recorded.
    let completed_this_week = tasks
        .iter()
        .filter(|t| t.completed && calendar.in_same_week(now, t.created_at))
        .count();
    let completion_rate = if total_tasks > 0 {
        100.0 * completed_tasks as f64 / total_tasks as f64
    } else {
        0.0
    };

    TaskStats {
        total_tasks,
        completed_tasks,
        overdue_tasks,
        upcoming_tasks,
        completed_this_week,
        completion_rate,
    }
}

pub fn type_distribution(tasks: &[Task]) -> TypeDistribution {
    TypeDistribution {
        regular: tasks.iter().filter(|t| t.is_regular()).count(),
        goals: tasks.iter().filter(|t| t.is_goal()).count(),
        recurring: tasks.iter().filter(|t| t.is_recurring()).count(),
        timers: tasks.iter().filter(|t| t.has_timer()).count(),
    }
}

/// Completed tasks per day of the week containing `week_of`, keyed by the
/// day each task was created.
pub fn weekly_completions(tasks: &[Task], week_of: Timestamp, calendar: &Calendar) -> Vec<DayCount> {
    calendar
        .week_days(week_of)
        .into_iter()
        .map(|date| DayCount {
            date,
            count: tasks
                .iter()
                .filter(|t| t.completed && t.created_at.date_naive() == date)
                .count(),
        })
        .collect()
}
