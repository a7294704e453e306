//! One user's task list bound to a store.
//!
//! The board is the only place tasks are mutated. Each mutation is written
//! back through the store and recorded as a [`BoardEvent`] for whatever
//! presentation layer is listening; the board itself has no UI side effects.

use thiserror::Error;
use tracing::{error, info};

use crate::calendar::Calendar;
use crate::goals::{self, GoalSummary};
use crate::models::{Priority, RecurrencePattern, Task, TaskStats, Timestamp};
use crate::recurrence;
use crate::stats::StatsReport;
use crate::store::{self, TaskStore};
use crate::timer::{self, TimerState};
use crate::views::{self, View};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Task text cannot be empty")]
    EmptyText,
    #[error("Task not found: {0}")]
    NotFound(String),
    #[error("Task id prefix '{0}' matches more than one task")]
    AmbiguousId(String),
    #[error("Task {0} has no timer")]
    NoTimer(String),
    #[error("A task with id {0} already exists")]
    DuplicateId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Incomplete,
    Completed,
}

impl Completion {
    fn of(completed: bool) -> Self {
        if completed {
            Completion::Completed
        } else {
            Completion::Incomplete
        }
    }
}

/// Result of toggling a task's completion flag
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub task_id: String,
    pub from: Completion,
    pub to: Completion,
    /// Set when completing a recurring task spawned its next occurrence
    pub next_occurrence: Option<Task>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Added(Task),
    Completed(Task),
    Reopened(Task),
    OccurrenceCreated(Task),
    Updated(Task),
    Deleted(Task),
    ClearedCompleted(usize),
    TimerStarted(Task),
    TimerReset(Task),
    TimerFinished(Task),
}

/// Field edits; `None` leaves a field unchanged, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub due_date: Option<Option<Timestamp>>,
    pub due_time: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub priority: Option<Option<Priority>>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_interval: Option<u32>,
    pub goal_start_date: Option<Timestamp>,
    pub goal_end_date: Option<Timestamp>,
    pub timer_duration: Option<u32>,
}

impl TaskPatch {
    fn apply(self, task: &mut Task) -> Result<(), BoardError> {
        if let Some(text) = self.text {
            task.text = normalize_text(&text)?;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(due_time) = self.due_time {
            task.due_time = due_time;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(pattern) = self.recurrence_pattern {
            task.recurrence_pattern = Some(pattern);
        }
        if let Some(interval) = self.recurrence_interval {
            task.recurrence_interval = Some(i64::from(interval));
        }
        if let Some(start) = self.goal_start_date {
            task.goal_start_date = Some(start);
        }
        if let Some(end) = self.goal_end_date {
            task.goal_end_date = Some(end);
        }
        if let Some(minutes) = self.timer_duration {
            task.timer_duration = Some(minutes);
        }
        Ok(())
    }
}

fn normalize_text(text: &str) -> Result<String, BoardError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BoardError::EmptyText);
    }
    Ok(text.to_string())
}

pub struct TaskBoard<S: TaskStore> {
    store: S,
    user_id: String,
    tasks: Vec<Task>,
    events: Vec<BoardEvent>,
    calendar: Calendar,
}

impl<S: TaskStore> TaskBoard<S> {
    /// Load `user_id`'s saved tasks from `store`; unreadable state starts empty
    pub fn open(store: S, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let tasks = store::load_tasks(&store, &user_id);
        Self {
            store,
            user_id,
            tasks,
            events: Vec::new(),
            calendar: Calendar::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find the full id of the task whose id is `id` or starts with it
    pub fn resolve(&self, id: &str) -> Result<String, BoardError> {
        if self.get(id).is_some() {
            return Ok(id.to_string());
        }
        let mut candidates = self.tasks.iter().filter(|t| !id.is_empty() && t.id.starts_with(id));
        match (candidates.next(), candidates.next()) {
            (Some(task), None) => Ok(task.id.clone()),
            (Some(_), Some(_)) => Err(BoardError::AmbiguousId(id.to_string())),
            _ => Err(BoardError::NotFound(id.to_string())),
        }
    }

    /// Add a fully built task. Ownership is forced to this board's user.
    pub fn add(&mut self, mut task: Task) -> Result<Task, BoardError> {
        task.text = normalize_text(&task.text)?;
        if self.get(&task.id).is_some() {
            return Err(BoardError::DuplicateId(task.id));
        }
        task.user_id = self.user_id.clone();
        self.tasks.push(task.clone());
        info!(task_id = %task.id, "task added");
        self.events.push(BoardEvent::Added(task.clone()));
        self.persist();
        Ok(task)
    }

    pub fn add_task(
        &mut self,
        text: &str,
        due: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Task, BoardError> {
        self.add(Task::new(self.user_id.clone(), text, now).with_due_date(due))
    }

    pub fn add_goal(
        &mut self,
        text: &str,
        start: Timestamp,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<Task, BoardError> {
        self.add(Task::new(self.user_id.clone(), text, now).goal(start, end))
    }

    pub fn add_recurring(
        &mut self,
        text: &str,
        due: Timestamp,
        pattern: RecurrencePattern,
        interval: u32,
        now: Timestamp,
    ) -> Result<Task, BoardError> {
        self.add(
            Task::new(self.user_id.clone(), text, now)
                .with_due_date(Some(due))
                .recurring(pattern, interval),
        )
    }

    pub fn add_timer(&mut self, text: &str, minutes: u32, now: Timestamp) -> Result<Task, BoardError> {
        self.add(Task::new(self.user_id.clone(), text, now).timer(minutes))
    }

    /// Flip a task's completion flag.
    ///
    /// Completing a recurring task appends its next occurrence; reopening
    /// never does. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str, now: Timestamp) -> Option<Transition> {
        let index = self.tasks.iter().position(|t| t.id == id)?;

        let from = Completion::of(self.tasks[index].completed);
        self.tasks[index].completed = !self.tasks[index].completed;
        let to = Completion::of(self.tasks[index].completed);
        let toggled = self.tasks[index].clone();

        let next_occurrence = if to == Completion::Completed {
            self.events.push(BoardEvent::Completed(toggled.clone()));
            recurrence::next_occurrence(&toggled, now)
        } else {
            self.events.push(BoardEvent::Reopened(toggled.clone()));
            None
        };

        if let Some(next) = &next_occurrence {
            info!(task_id = %toggled.id, next_id = %next.id, "scheduled next occurrence");
            self.tasks.push(next.clone());
            self.events.push(BoardEvent::OccurrenceCreated(next.clone()));
        }

        self.persist();
        Some(Transition {
            task_id: toggled.id,
            from,
            to,
            next_occurrence,
        })
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, BoardError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;

        let mut edited = task.clone();
        patch.apply(&mut edited)?;
        *task = edited.clone();

        self.events.push(BoardEvent::Updated(edited.clone()));
        self.persist();
        Ok(edited)
    }

    pub fn delete(&mut self, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(index);
        self.events.push(BoardEvent::Deleted(removed.clone()));
        self.persist();
        Some(removed)
    }

    /// Drop every completed task, returning how many were removed
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            self.events.push(BoardEvent::ClearedCompleted(removed));
            self.persist();
        }
        removed
    }

    /// Start a task's countdown. An already started timer keeps its start time.
    pub fn start_timer(&mut self, id: &str, now: Timestamp) -> Result<TimerState, BoardError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
        if timer::total_seconds(task).is_none() {
            return Err(BoardError::NoTimer(id.to_string()));
        }

        if task.timer_started.is_none() {
            task.timer_started = Some(now);
            let started = task.clone();
            self.events.push(BoardEvent::TimerStarted(started));
            self.persist();
        }
        Ok(self
            .get(id)
            .map(|t| timer::timer_state(t, now))
            .unwrap_or(TimerState::NotConfigured))
    }

    pub fn reset_timer(&mut self, id: &str) -> Result<(), BoardError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
        if !task.has_timer() {
            return Err(BoardError::NoTimer(id.to_string()));
        }

        task.timer_started = None;
        task.timer_ended = None;
        let reset = task.clone();
        self.events.push(BoardEvent::TimerReset(reset));
        self.persist();
        Ok(())
    }

    /// Stamp the end time on every running timer that has reached zero.
    /// The stamp is when the countdown ran out, not `now`.
    /// Returns the ids of the timers that finished.
    pub fn tick(&mut self, now: Timestamp) -> Vec<String> {
        let mut finished = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| timer::has_expired(t, now)) {
            task.timer_ended = Some(timer::ends_at(task).unwrap_or(now));
            finished.push(task.id.clone());
            self.events.push(BoardEvent::TimerFinished(task.clone()));
        }
        if !finished.is_empty() {
            self.persist();
        }
        finished
    }

    /// Filtered and display-ordered tasks for `view`
    pub fn view(&self, view: View, include_completed: bool, now: Timestamp) -> Vec<Task> {
        let mut tasks = views::filter(&self.tasks, view, include_completed, now, &self.calendar);
        views::sort_for_display(&mut tasks);
        tasks
    }

    pub fn upcoming(&self, now: Timestamp, limit: usize) -> Vec<Task> {
        views::upcoming_digest(&self.tasks, now, &self.calendar, limit)
    }

    pub fn stats(&self, now: Timestamp) -> TaskStats {
        crate::stats::stats(&self.tasks, now, &self.calendar)
    }

    pub fn report(&self, now: Timestamp, week_offset: i64) -> StatsReport {
        StatsReport::build(&self.tasks, now, &self.calendar, week_offset)
    }

    pub fn goal_summaries(&self, now: Timestamp, include_completed: bool) -> Vec<(Task, GoalSummary)> {
        self.view(View::Goals, include_completed, now)
            .into_iter()
            .map(|goal| {
                let summary = goals::summarize(&goal, now);
                (goal, summary)
            })
            .collect()
    }

    /// Hand over the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // Saves are fire-and-forget: a failure is logged and the in-memory list
    // stays authoritative.
    fn persist(&mut self) {
        if let Err(e) = store::save_tasks(&mut self.store, &self.user_id, &self.tasks) {
            error!(user_id = %self.user_id, error = %e, "failed to save tasks");
        }
    }
}
