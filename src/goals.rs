use crate::calendar::days_between;
use crate::models::{Task, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Ended,
    /// Start or end date missing
    Unscheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalSummary {
    pub progress: u8,
    pub days_remaining: i64,
    pub status: GoalStatus,
}

/// Elapsed share of the goal window as a whole percentage in `[0, 100]`
pub fn progress(goal: &Task, now: Timestamp) -> u8 {
    let (Some(start), Some(end)) = (goal.goal_start_date, goal.goal_end_date) else {
        return 0;
    };
    if now < start {
        return 0;
    }
    if now > end {
        return 100;
    }

    let total_days = days_between(start, end).max(1);
    let elapsed = days_between(start, now);
    let percent = (100.0 * elapsed as f64 / total_days as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Whole days left until the goal ends, never negative
pub fn days_remaining(goal: &Task, now: Timestamp) -> i64 {
    let (Some(_), Some(end)) = (goal.goal_start_date, goal.goal_end_date) else {
        return 0;
    };
    if now > end {
        return 0;
    }
    days_between(now, end).max(0)
}

pub fn status(goal: &Task, now: Timestamp) -> GoalStatus {
    match (goal.goal_start_date, goal.goal_end_date) {
        (Some(start), Some(_)) if now < start => GoalStatus::NotStarted,
        (Some(_), Some(end)) if now > end => GoalStatus::Ended,
        (Some(_), Some(_)) => GoalStatus::InProgress,
        _ => GoalStatus::Unscheduled,
    }
}

pub fn summarize(goal: &Task, now: Timestamp) -> GoalSummary {
    GoalSummary {
        progress: progress(goal, now),
        days_remaining: days_remaining(goal, now),
        status: status(goal, now),
    }
}
