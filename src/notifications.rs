use serde::Serialize;

use crate::board::BoardEvent;
use crate::models::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Collects notifications from board events, newest first
#[derive(Debug, Default)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn board events into notifications. Returns how many were added.
    pub fn ingest(&mut self, events: &[BoardEvent], now: Timestamp) -> usize {
        let mut added = 0;
        for event in events {
            if let Some((prefix, kind, message, task_id)) = describe(event) {
                let id = format!("{}-{}", prefix, task_id);
                self.push(Notification {
                    id,
                    message,
                    kind,
                    read: false,
                    created_at: now,
                    task_id: Some(task_id),
                });
                added += 1;
            }
        }
        added
    }

    pub fn push(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_all_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
    }
}

fn describe(event: &BoardEvent) -> Option<(&'static str, NotificationKind, String, String)> {
    match event {
        BoardEvent::Added(task) => {
            let due = task.due_date?;
            Some((
                "due",
                NotificationKind::Info,
                format!("New task \"{}\" due on {}", task.text, due.format("%b %-d, %Y")),
                task.id.clone(),
            ))
        }
        BoardEvent::Completed(task) => Some((
            "completed",
            NotificationKind::Success,
            "Great job completing your task!".to_string(),
            task.id.clone(),
        )),
        BoardEvent::OccurrenceCreated(task) => {
            let due = task.due_date?;
            Some((
                "next",
                NotificationKind::Info,
                format!("Next \"{}\" scheduled for {}", task.text, due.format("%b %-d, %Y")),
                task.id.clone(),
            ))
        }
        BoardEvent::TimerFinished(task) => Some((
            "timer",
            NotificationKind::Warning,
            format!("Time is up for \"{}\"", task.text),
            task.id.clone(),
        )),
        _ => None,
    }
}
