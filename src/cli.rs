use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use thiserror::Error;

use crate::board::{BoardError, Completion, TaskBoard, TaskPatch};
use crate::config::Config;
use crate::goals::GoalStatus;
use crate::models::{Priority, RecurrencePattern, Task, Timestamp};
use crate::notifications::NotificationCenter;
use crate::store::TaskStore;
use crate::timer::{self, TimerState};
use crate::utils::{parse_time_of_day, parse_timestamp};
use crate::views::View;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Tasks, goals, recurring items and timers with a dashboard")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// User whose tasks to work on (defaults to the configured user)
    #[arg(short, long)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task text
        text: String,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
        /// Due time of day (HH:MM)
        #[arg(long)]
        time: Option<String>,
        /// Free-form category
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
    },
    /// Add a goal with a start and end date
    AddGoal {
        text: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Add a recurring task
    AddRecurring {
        text: String,
        /// Due date of the first occurrence
        #[arg(long)]
        due: String,
        #[arg(long, value_enum, default_value_t = PatternArg::Weekly)]
        pattern: PatternArg,
        /// Repeat every N days, weeks or months
        #[arg(long, default_value_t = 1)]
        every: u32,
    },
    /// Add a task with a countdown timer
    AddTimer {
        text: String,
        /// Timer length in minutes
        #[arg(long)]
        minutes: u32,
    },
    /// List tasks through a view (today, week, upcoming, overdue, goals, recurring, timers, all)
    List {
        #[arg(long)]
        view: Option<String>,
        #[arg(long, conflicts_with = "hide_completed")]
        show_completed: bool,
        #[arg(long)]
        hide_completed: bool,
    },
    /// Toggle a task between open and completed
    Toggle { id: String },
    /// Edit a task
    Edit(EditArgs),
    /// Delete a task
    Delete { id: String },
    /// Delete every completed task
    ClearCompleted,
    /// Summary counts and the next few due tasks
    Dashboard,
    /// Completion statistics, task types and the weekly histogram
    Stats {
        /// Week to chart relative to this one (-1 is last week)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        week_offset: i64,
    },
    /// Goals with their progress
    Goals,
    /// Timed tasks with their remaining time
    Timers,
    /// Start a task's timer
    TimerStart { id: String },
    /// Reset a task's timer
    TimerReset { id: String },
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,
    /// New recurrence pattern for a recurring task
    #[arg(long, value_enum)]
    pub pattern: Option<PatternArg>,
    /// New recurrence interval
    #[arg(long)]
    pub every: Option<u32>,
    /// New goal start date
    #[arg(long)]
    pub start: Option<String>,
    /// New goal end date
    #[arg(long)]
    pub end: Option<String>,
    /// New timer length in minutes
    #[arg(long)]
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl From<PatternArg> for RecurrencePattern {
    fn from(value: PatternArg) -> Self {
        match value {
            PatternArg::Daily => RecurrencePattern::Daily,
            PatternArg::Weekly => RecurrencePattern::Weekly,
            PatternArg::Monthly => RecurrencePattern::Monthly,
            PatternArg::Custom => RecurrencePattern::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    BoardError(#[from] BoardError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("Failed to write output: {0}")]
    IoError(#[from] io::Error),
}

fn parse_date_arg(raw: &str) -> Result<Timestamp, CliError> {
    parse_timestamp(raw).ok_or_else(|| {
        CliError::DateParseError(format!("Invalid date format '{}': use YYYY-MM-DD", raw))
    })
}

/// Dispatch one command against `board`, then report any notifications the
/// command produced. `None` lists the configured default view.
pub fn run<S: TaskStore, W: Write>(
    command: Option<Commands>,
    board: &mut TaskBoard<S>,
    config: &Config,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    // Timers that ran out since the last invocation
    board.tick(now);

    match command {
        None => handle_list(board, config.default_view(), config.show_completed_tasks, now, out)?,
        Some(Commands::Add { text, due, time, category, priority }) => {
            handle_add_task(board, &text, due, time, category, priority, now, out)?
        }
        Some(Commands::AddGoal { text, start, end }) => {
            handle_add_goal(board, &text, &start, &end, now, out)?
        }
        Some(Commands::AddRecurring { text, due, pattern, every }) => {
            handle_add_recurring(board, &text, &due, pattern, every, now, out)?
        }
        Some(Commands::AddTimer { text, minutes }) => {
            let task = board.add_timer(&text, minutes, now)?;
            writeln!(out, "Timer task created successfully (ID: {})", task.id)?;
        }
        Some(Commands::List { view, show_completed, hide_completed }) => {
            let view = view
                .as_deref()
                .map(View::parse_or_all)
                .unwrap_or_else(|| config.default_view());
            let include_completed = if show_completed {
                true
            } else if hide_completed {
                false
            } else {
                config.show_completed_tasks
            };
            handle_list(board, view, include_completed, now, out)?
        }
        Some(Commands::Toggle { id }) => handle_toggle(board, &id, now, out)?,
        Some(Commands::Edit(args)) => handle_edit(board, args, out)?,
        Some(Commands::Delete { id }) => {
            let id = board.resolve(&id)?;
            if let Some(task) = board.delete(&id) {
                writeln!(out, "Deleted \"{}\"", task.text)?;
            }
        }
        Some(Commands::ClearCompleted) => {
            let removed = board.clear_completed();
            writeln!(out, "Cleared {} completed task(s)", removed)?;
        }
        Some(Commands::Dashboard) => handle_dashboard(board, now, out)?,
        Some(Commands::Stats { week_offset }) => handle_stats(board, week_offset, now, out)?,
        Some(Commands::Goals) => handle_goals(board, config.show_completed_tasks, now, out)?,
        Some(Commands::Timers) => handle_timers(board, config.show_completed_tasks, now, out)?,
        Some(Commands::TimerStart { id }) => {
            let id = board.resolve(&id)?;
            match board.start_timer(&id, now)? {
                TimerState::Running { remaining } => {
                    writeln!(out, "Timer running, {} left", timer::format_clock(remaining))?
                }
                _ => writeln!(out, "Timer already finished")?,
            }
        }
        Some(Commands::TimerReset { id }) => {
            let id = board.resolve(&id)?;
            board.reset_timer(&id)?;
            writeln!(out, "Timer reset")?;
        }
    }

    let mut center = NotificationCenter::new();
    center.ingest(&board.drain_events(), now);
    for notification in center.notifications().iter().rev() {
        writeln!(out, "* {}", notification.message)?;
    }

    Ok(())
}

/// Handle the add command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_task<S: TaskStore, W: Write>(
    board: &mut TaskBoard<S>,
    text: &str,
    due: Option<String>,
    time: Option<String>,
    category: Option<String>,
    priority: Option<PriorityArg>,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let due_date = due.as_deref().map(parse_date_arg).transpose()?;
    if let Some(time) = &time {
        parse_time_of_day(time)
            .map_err(|e| CliError::TimeParseError(format!("Invalid time '{}': {}", time, e)))?;
    }

    let mut task = Task::new(board.user_id(), text, now).with_due_date(due_date);
    task.due_time = time;
    task.category = category;
    task.priority = priority.map(Priority::from);

    let task = board.add(task)?;
    writeln!(out, "Task created successfully (ID: {})", task.id)?;
    Ok(())
}

/// Handle the add-goal command
pub fn handle_add_goal<S: TaskStore, W: Write>(
    board: &mut TaskBoard<S>,
    text: &str,
    start: &str,
    end: &str,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let start = parse_date_arg(start)?;
    let end = parse_date_arg(end)?;
    let goal = board.add_goal(text, start, end, now)?;
    writeln!(out, "Goal created successfully (ID: {})", goal.id)?;
    Ok(())
}

/// Handle the add-recurring command
pub fn handle_add_recurring<S: TaskStore, W: Write>(
    board: &mut TaskBoard<S>,
    text: &str,
    due: &str,
    pattern: PatternArg,
    every: u32,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let due = parse_date_arg(due)?;
    let pattern = RecurrencePattern::from(pattern);
    let task = board.add_recurring(text, due, pattern.clone(), every.max(1), now)?;
    writeln!(
        out,
        "Recurring task created successfully (ID: {}), {}",
        task.id,
        pattern.describe(task.effective_interval()).to_lowercase()
    )?;
    Ok(())
}

pub fn handle_list<S: TaskStore, W: Write>(
    board: &TaskBoard<S>,
    view: View,
    include_completed: bool,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let tasks = board.view(view, include_completed, now);
    if tasks.is_empty() {
        writeln!(out, "No tasks found in this view ({})", view)?;
        return Ok(());
    }
    for task in &tasks {
        writeln!(out, "{}", format_task_line(task))?;
    }
    Ok(())
}

pub fn handle_toggle<S: TaskStore, W: Write>(
    board: &mut TaskBoard<S>,
    id: &str,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let id = board.resolve(id)?;
    let Some(transition) = board.toggle(&id, now) else {
        return Err(BoardError::NotFound(id).into());
    };
    match transition.to {
        Completion::Completed => writeln!(out, "Marked {} as done", short_id(&transition.task_id))?,
        Completion::Incomplete => writeln!(out, "Reopened {}", short_id(&transition.task_id))?,
    }
    Ok(())
}

pub fn handle_edit<S: TaskStore, W: Write>(
    board: &mut TaskBoard<S>,
    args: EditArgs,
    out: &mut W,
) -> Result<(), CliError> {
    let id = board.resolve(&args.id)?;
    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due.as_deref().map(parse_date_arg).transpose()?.map(Some)
    };
    let patch = TaskPatch {
        text: args.text,
        due_date,
        category: args.category.map(Some),
        priority: args.priority.map(|p| Some(Priority::from(p))),
        recurrence_pattern: args.pattern.map(RecurrencePattern::from),
        recurrence_interval: args.every.map(|every| every.max(1)),
        goal_start_date: args.start.as_deref().map(parse_date_arg).transpose()?,
        goal_end_date: args.end.as_deref().map(parse_date_arg).transpose()?,
        timer_duration: args.minutes,
        ..TaskPatch::default()
    };
    let task = board.update(&id, patch)?;
    writeln!(out, "Updated {}", format_task_line(&task))?;
    Ok(())
}

pub fn handle_dashboard<S: TaskStore, W: Write>(
    board: &TaskBoard<S>,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let stats = board.stats(now);
    writeln!(out, "Total:               {}", stats.total_tasks)?;
    writeln!(out, "Completed:           {}", stats.completed_tasks)?;
    writeln!(out, "Overdue:             {}", stats.overdue_tasks)?;
    writeln!(out, "Upcoming:            {}", stats.upcoming_tasks)?;
    writeln!(out, "Completed this week: {}", stats.completed_this_week)?;
    writeln!(out, "Completion rate:     {}", stats.completion_rate_label())?;

    let upcoming = board.upcoming(now, 5);
    if !upcoming.is_empty() {
        writeln!(out)?;
        writeln!(out, "Coming up:")?;
        for task in &upcoming {
            writeln!(out, "{}", format_task_line(task))?;
        }
    }
    Ok(())
}

pub fn handle_stats<S: TaskStore, W: Write>(
    board: &TaskBoard<S>,
    week_offset: i64,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let report = board.report(now, week_offset);
    writeln!(
        out,
        "{} of {} tasks completed ({})",
        report.summary.completed_tasks,
        report.summary.total_tasks,
        report.summary.completion_rate_label()
    )?;

    let d = report.distribution;
    writeln!(
        out,
        "Regular {} | Goals {} | Recurring {} | Timers {}",
        d.regular, d.goals, d.recurring, d.timers
    )?;

    writeln!(out)?;
    let scale = report.busiest_day();
    for day in &report.week {
        let bar = "#".repeat(day.count * 20 / scale);
        writeln!(out, "{} {:>3} {}", day.date.format("%a %b %d"), day.count, bar)?;
    }
    Ok(())
}

pub fn handle_goals<S: TaskStore, W: Write>(
    board: &TaskBoard<S>,
    include_completed: bool,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let goals = board.goal_summaries(now, include_completed);
    if goals.is_empty() {
        writeln!(out, "No goals yet")?;
        return Ok(());
    }
    for (goal, summary) in goals {
        let status = match summary.status {
            GoalStatus::NotStarted => "not started".to_string(),
            GoalStatus::InProgress => format!("{} days remaining", summary.days_remaining),
            GoalStatus::Ended => "ended".to_string(),
            GoalStatus::Unscheduled => "no dates".to_string(),
        };
        writeln!(
            out,
            "{}  {:>3}%  {}  ({})",
            short_id(&goal.id),
            summary.progress,
            goal.text,
            status
        )?;
    }
    Ok(())
}

pub fn handle_timers<S: TaskStore, W: Write>(
    board: &TaskBoard<S>,
    include_completed: bool,
    now: Timestamp,
    out: &mut W,
) -> Result<(), CliError> {
    let timers = board.view(View::Timers, include_completed, now);
    if timers.is_empty() {
        writeln!(out, "No timers yet")?;
        return Ok(());
    }
    for task in &timers {
        let state = match timer::timer_state(task, now) {
            TimerState::NotConfigured => "no duration".to_string(),
            TimerState::Idle { remaining } => format!("{} ready", timer::format_clock(remaining)),
            TimerState::Running { remaining } => {
                format!("{} left", timer::format_clock(remaining))
            }
            TimerState::Finished => "done".to_string(),
        };
        writeln!(out, "{}  {}  ({})", short_id(&task.id), task.text, state)?;
    }
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "{}  [{}] {}",
        short_id(&task.id),
        if task.completed { "x" } else { " " },
        task.text
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
        if let Some(time) = &task.due_time {
            line.push_str(&format!(" {}", time));
        }
    }
    if let Some(priority) = task.priority {
        line.push_str(&format!("  !{}", priority));
    }
    if let Some(category) = &task.category {
        line.push_str(&format!("  #{}", category));
    }
    if task.is_recurring() {
        // A missing pattern recurs weekly regardless of the interval
        let schedule = match &task.recurrence_pattern {
            Some(pattern) => pattern.describe(task.effective_interval()),
            None => "Every week".to_string(),
        };
        line.push_str(&format!("  ({})", schedule.to_lowercase()));
    }
    line
}
