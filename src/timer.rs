use chrono::TimeDelta;

use crate::models::{Task, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// No timer flag, or no positive duration
    NotConfigured,
    Idle { remaining: i64 },
    Running { remaining: i64 },
    Finished,
}

/// Configured countdown length in seconds
pub fn total_seconds(task: &Task) -> Option<i64> {
    if !task.has_timer() {
        return None;
    }
    match task.timer_duration {
        Some(minutes) if minutes > 0 => Some(i64::from(minutes) * 60),
        _ => None,
    }
}

pub fn timer_state(task: &Task, now: Timestamp) -> TimerState {
    let Some(total) = total_seconds(task) else {
        return TimerState::NotConfigured;
    };
    if task.timer_ended.is_some() {
        return TimerState::Finished;
    }
    match task.timer_started {
        Some(started) => {
            let elapsed = (now - started).num_seconds().max(0);
            let remaining = total - elapsed;
            if remaining > 0 {
                TimerState::Running { remaining }
            } else {
                TimerState::Finished
            }
        }
        None => TimerState::Idle { remaining: total },
    }
}

/// Instant a started countdown reaches zero
pub fn ends_at(task: &Task) -> Option<Timestamp> {
    let started = task.timer_started?;
    let total = TimeDelta::try_seconds(total_seconds(task)?)?;
    started.checked_add_signed(total)
}

/// Seconds left on the countdown, or `None` when no timer is configured
pub fn remaining_seconds(task: &Task, now: Timestamp) -> Option<i64> {
    match timer_state(task, now) {
        TimerState::NotConfigured => None,
        TimerState::Idle { remaining } | TimerState::Running { remaining } => Some(remaining),
        TimerState::Finished => Some(0),
    }
}

/// Share of the countdown already used, 0.0 to 100.0
pub fn progress_percent(task: &Task, now: Timestamp) -> f64 {
    match (total_seconds(task), remaining_seconds(task, now)) {
        (Some(total), Some(remaining)) => 100.0 - (remaining as f64 / total as f64) * 100.0,
        _ => 0.0,
    }
}

/// A started timer that has run out but has not been stamped as ended yet
pub fn has_expired(task: &Task, now: Timestamp) -> bool {
    task.timer_started.is_some()
        && task.timer_ended.is_none()
        && timer_state(task, now) == TimerState::Finished
}

/// Render seconds as `MM:SS`
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
