pub mod board;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod goals;
pub mod models;
pub mod notifications;
pub mod recurrence;
pub mod stats;
pub mod store;
pub mod timer;
pub mod utils;
pub mod views;

pub use board::TaskBoard;
pub use calendar::Calendar;
pub use config::Config;
pub use database::Database;
pub use models::{Task, TaskStats};
pub use store::{MemoryStore, TaskStore};
pub use utils::Profile;
pub use views::View;
