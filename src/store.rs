//! Persistence port for per-user task lists.
//!
//! A store is a plain string key-value map. Each user's list lives under
//! `tasks-<userId>` as a JSON array of task records. Loading never fails:
//! anything that cannot be read back cleanly is treated as "no saved tasks".

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use crate::database::DatabaseError;
use crate::models::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to encode tasks: {0}")]
    EncodeError(#[from] serde_json::Error),
}

/// Why a saved document was discarded on load
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record {index} has an empty id")]
    EmptyId { index: usize },
    #[error("Task {id} has empty text")]
    EmptyText { id: String },
    #[error("Task {id} belongs to user {owner}")]
    ForeignOwner { id: String, owner: String },
    #[error("Task id {id} appears more than once")]
    DuplicateId { id: String },
}

/// Opaque get/set storage collaborator
pub trait TaskStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: TaskStore + ?Sized> TaskStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<S: TaskStore + ?Sized> TaskStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

pub fn storage_key(user_id: &str) -> String {
    format!("tasks-{}", user_id)
}

/// Parse and validate a saved document for `user_id`
pub fn decode_tasks(raw: &str, user_id: &str) -> Result<Vec<Task>, DecodeError> {
    let tasks: Vec<Task> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(DecodeError::EmptyId { index });
        }
        if task.text.trim().is_empty() {
            return Err(DecodeError::EmptyText { id: task.id.clone() });
        }
        if task.user_id != user_id {
            return Err(DecodeError::ForeignOwner {
                id: task.id.clone(),
                owner: task.user_id.clone(),
            });
        }
        if !seen.insert(task.id.as_str()) {
            return Err(DecodeError::DuplicateId { id: task.id.clone() });
        }
    }
    Ok(tasks)
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tasks)
}

/// Load a user's tasks, falling back to an empty list on any failure
pub fn load_tasks<S: TaskStore + ?Sized>(store: &S, user_id: &str) -> Vec<Task> {
    let key = storage_key(user_id);
    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(%key, "no saved tasks");
            return Vec::new();
        }
        Err(e) => {
            warn!(%key, error = %e, "failed to read saved tasks, starting empty");
            return Vec::new();
        }
    };

    match decode_tasks(&raw, user_id) {
        Ok(tasks) => {
            debug!(%key, count = tasks.len(), "loaded tasks");
            tasks
        }
        Err(e) => {
            warn!(%key, error = %e, "discarding unreadable saved tasks");
            Vec::new()
        }
    }
}

pub fn save_tasks<S: TaskStore + ?Sized>(
    store: &mut S,
    user_id: &str,
    tasks: &[Task],
) -> Result<(), StoreError> {
    let encoded = encode_tasks(tasks)?;
    store.set(&storage_key(user_id), &encoded)
}

/// In-process store, handy for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TaskStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
