//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where tasks persist and how the reminder scanner ticks.
//!
//! # Invariants
//! - Configuration is passed explicitly; core reads no environment variables.
//! - `scan_interval` is never below `MIN_SCAN_INTERVAL`; the scanner clamps
//!   it again, so a struct literal with a zero interval is still safe.

use crate::reminder::scanner::{ReminderPolicy, MIN_SCAN_INTERVAL};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TASK_FILE_NAME: &str = "tasks.txt";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Settings used by [`crate::AppContext::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
    pub scan_interval: Duration,
    pub reminder_policy: ReminderPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_name: DEFAULT_TASK_FILE_NAME.to_string(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            reminder_policy: ReminderPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Default settings rooted at `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval.max(MIN_SCAN_INTERVAL);
        self
    }

    pub fn with_reminder_policy(mut self, policy: ReminderPolicy) -> Self {
        self.reminder_policy = policy;
        self
    }

    /// Full path of the persisted task file.
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}
