//! Core domain logic for the to-do app.
//! This crate is the single source of truth for task storage and reminders;
//! presentation layers call into it and render what it returns.

pub mod app;
pub mod config;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use app::{AppContext, AppError, AppResult};
pub use config::{CoreConfig, DEFAULT_SCAN_INTERVAL, DEFAULT_TASK_FILE_NAME};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{parse_time_of_day, Task, TimeOfDay};
pub use reminder::scanner::{
    due_reminders, Clock, LocalClock, ReminderEvent, ReminderPolicy, ReminderScanner,
    ScannerError, ScannerState, MIN_SCAN_INTERVAL,
};
pub use repo::task_file::{FileTaskRepository, RepoError, RepoResult, TaskRepository};
pub use service::task_store::{SharedTaskStore, TaskStore, TaskStoreError, TaskStoreResult};

/// Minimal health-check API for presentation-layer wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
