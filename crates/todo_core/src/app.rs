//! Top-level application context.
//!
//! # Responsibility
//! - Own exactly one task store and one reminder scanner.
//! - Serialize foreground store access through the shared lock.
//!
//! # Invariants
//! - Presentation code receives the context explicitly; nothing here is global.
//! - The scanner is running for the whole lifetime of an opened context and
//!   is stopped when the context is dropped.

use crate::config::CoreConfig;
use crate::model::task::Task;
use crate::reminder::scanner::{Clock, LocalClock, ReminderEvent, ReminderScanner, ScannerError};
use crate::repo::task_file::FileTaskRepository;
use crate::service::task_store::{SharedTaskStore, TaskStore, TaskStoreError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, MutexGuard};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// Data directory could not be created.
    DataDir(std::io::Error),
    Store(TaskStoreError),
    Scanner(ScannerError),
    /// A previous holder of the store lock panicked.
    LockPoisoned,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataDir(err) => write!(f, "failed to prepare data directory: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Scanner(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "task store lock poisoned"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DataDir(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Scanner(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<TaskStoreError> for AppError {
    fn from(value: TaskStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ScannerError> for AppError {
    fn from(value: ScannerError) -> Self {
        Self::Scanner(value)
    }
}

/// Owner of the task store and the reminder scanner.
pub struct AppContext {
    store: SharedTaskStore<FileTaskRepository>,
    scanner: ReminderScanner<FileTaskRepository>,
}

impl AppContext {
    /// Loads tasks from `config.data_file()` and starts the reminder scanner.
    ///
    /// Returns the receiver on which reminder events are delivered.
    pub fn open(config: &CoreConfig) -> AppResult<(Self, Receiver<ReminderEvent>)> {
        Self::open_with_clock(config, Arc::new(LocalClock))
    }

    /// Same as [`AppContext::open`] with a caller-provided clock.
    pub fn open_with_clock(
        config: &CoreConfig,
        clock: Arc<dyn Clock>,
    ) -> AppResult<(Self, Receiver<ReminderEvent>)> {
        std::fs::create_dir_all(&config.data_dir).map_err(|err| {
            error!("event=app_open module=app status=error error_code=data_dir error={err}");
            AppError::DataDir(err)
        })?;

        let repo = FileTaskRepository::new(config.data_file());
        let store = TaskStore::open(repo)?;
        let count = store.len();
        let store = store.into_shared();

        let (mut scanner, events) = ReminderScanner::with_clock(
            Arc::clone(&store),
            config.scan_interval,
            config.reminder_policy,
            clock,
        );
        scanner.start()?;

        info!("event=app_open module=app status=ok count={count}");
        Ok((Self { store, scanner }, events))
    }

    /// Shared store handle, for callers that manage locking themselves.
    pub fn store(&self) -> &SharedTaskStore<FileTaskRepository> {
        &self.store
    }

    pub fn scanner(&self) -> &ReminderScanner<FileTaskRepository> {
        &self.scanner
    }

    pub fn scanner_mut(&mut self) -> &mut ReminderScanner<FileTaskRepository> {
        &mut self.scanner
    }

    /// Snapshot of the current in-memory tasks.
    pub fn tasks(&self) -> AppResult<Vec<Task>> {
        Ok(self.lock()?.tasks().to_vec())
    }

    pub fn add(&self, text: &str) -> AppResult<()> {
        Ok(self.lock()?.add(text)?)
    }

    pub fn schedule(&self, text: &str, time: &str) -> AppResult<()> {
        Ok(self.lock()?.schedule(text, time)?)
    }

    pub fn remove(&self, index: Option<usize>) -> AppResult<Task> {
        Ok(self.lock()?.remove(index)?)
    }

    pub fn toggle_completion(&self, index: Option<usize>) -> AppResult<Task> {
        Ok(self.lock()?.toggle_completion(index)?.clone())
    }

    pub fn filter(&self, query: &str) -> AppResult<Vec<Task>> {
        Ok(self.lock()?.filter(query)?)
    }

    /// Stops the reminder scanner. Also happens on drop.
    pub fn shutdown(&mut self) {
        self.scanner.stop();
        info!("event=app_shutdown module=app status=ok");
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, TaskStore<FileTaskRepository>>> {
        self.store.lock().map_err(|_| {
            error!("event=store_lock module=app status=error error_code=lock_poisoned");
            AppError::LockPoisoned
        })
    }
}
