//! Task store use-case service.
//!
//! # Responsibility
//! - Hold the ordered in-memory task list.
//! - Validate user input for add/schedule.
//! - Persist the full list after every mutation.
//!
//! # Invariants
//! - Order is insertion order and matches file order.
//! - Every mutation is followed by exactly one full save.
//! - A failed save keeps the in-memory mutation and reports `Io`.
//! - Invalid input and invalid indices leave the list untouched.

use crate::model::task::{parse_time_of_day, Task};
use crate::repo::task_file::{RepoError, TaskRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Store shared between foreground callers and the reminder scanner.
pub type SharedTaskStore<R> = Arc<Mutex<TaskStore<R>>>;

/// Service error for task store use-cases.
#[derive(Debug)]
pub enum TaskStoreError {
    /// Task text is empty or whitespace only.
    BlankText,
    /// Schedule time is not a 24-hour `H:MM` value.
    InvalidTimeFormat(String),
    /// No selection, or position outside the list.
    InvalidIndex { index: Option<usize>, len: usize },
    /// Reading or writing persisted storage failed.
    Io(RepoError),
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText => write!(f, "task text cannot be empty"),
            Self::InvalidTimeFormat(value) => {
                write!(f, "invalid time format `{value}`; use HH:mm (e.g. 18:00)")
            }
            Self::InvalidIndex { index: None, .. } => write!(f, "no task selected"),
            Self::InvalidIndex {
                index: Some(index),
                len,
            } => write!(f, "task index {index} out of range (len {len})"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskStoreError {
    fn from(value: RepoError) -> Self {
        Self::Io(value)
    }
}

/// Ordered task list backed by a repository.
pub struct TaskStore<R: TaskRepository> {
    repo: R,
    tasks: Vec<Task>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Creates an empty store; call [`TaskStore::reload`] or use
    /// [`TaskStore::open`] to populate it from storage.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            tasks: Vec::new(),
        }
    }

    /// Creates a store populated from persisted storage.
    pub fn open(repo: R) -> TaskStoreResult<Self> {
        let mut store = Self::new(repo);
        store.reload()?;
        Ok(store)
    }

    /// Wraps this store for sharing with the reminder scanner.
    pub fn into_shared(self) -> SharedTaskStore<R> {
        Arc::new(Mutex::new(self))
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Current in-memory tasks in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Reads persisted tasks without touching the in-memory list.
    pub fn load(&self) -> TaskStoreResult<Vec<Task>> {
        Ok(self.repo.load()?)
    }

    /// Persists `tasks` as the full stored contents.
    pub fn save(&self, tasks: &[Task]) -> TaskStoreResult<()> {
        Ok(self.repo.save(tasks)?)
    }

    /// Replaces the in-memory list with persisted contents.
    pub fn reload(&mut self) -> TaskStoreResult<&[Task]> {
        self.tasks = self.repo.load()?;
        Ok(&self.tasks)
    }

    /// Appends an unscheduled, incomplete task with trimmed `text`.
    pub fn add(&mut self, text: &str) -> TaskStoreResult<()> {
        let text = require_text(text)?;
        self.tasks.push(Task::unscheduled(text));
        info!(
            "event=task_add module=service status=ok index={}",
            self.tasks.len() - 1
        );
        self.persist()
    }

    /// Appends a task scheduled at `time` (`H:MM`, 24-hour).
    pub fn schedule(&mut self, text: &str, time: &str) -> TaskStoreResult<()> {
        let text = require_text(text)?;
        let Some(time_of_day) = parse_time_of_day(time) else {
            warn!("event=task_schedule module=service status=error error_code=invalid_time");
            return Err(TaskStoreError::InvalidTimeFormat(time.trim().to_string()));
        };
        self.tasks.push(Task::new(text, Some(time_of_day), false));
        info!(
            "event=task_schedule module=service status=ok index={} time={}",
            self.tasks.len() - 1,
            time_of_day.format("%H:%M")
        );
        self.persist()
    }

    /// Removes the task at `index`; `None` means nothing is selected.
    pub fn remove(&mut self, index: Option<usize>) -> TaskStoreResult<Task> {
        let index = self.check_index(index)?;
        let removed = self.tasks.remove(index);
        info!("event=task_remove module=service status=ok index={index}");
        self.persist()?;
        Ok(removed)
    }

    /// Replaces the task at `index` with a copy whose completion is negated.
    pub fn toggle_completion(&mut self, index: Option<usize>) -> TaskStoreResult<&Task> {
        let index = self.check_index(index)?;
        let toggled = self.tasks[index].toggled();
        info!(
            "event=task_toggle module=service status=ok index={index} completed={}",
            toggled.is_completed()
        );
        self.tasks[index] = toggled;
        self.persist()?;
        Ok(&self.tasks[index])
    }

    /// Case-insensitive substring search over persisted tasks.
    ///
    /// Always reads storage rather than the in-memory list. A blank query is a
    /// refresh: it returns every persisted task and resyncs the in-memory list
    /// to match, discarding unsaved drift.
    pub fn filter(&mut self, query: &str) -> TaskStoreResult<Vec<Task>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            let persisted = self.reload()?.to_vec();
            info!(
                "event=task_filter module=service status=ok mode=refresh count={}",
                persisted.len()
            );
            return Ok(persisted);
        }

        let hits = self
            .repo
            .load()?
            .into_iter()
            .filter(|task| task.text().to_lowercase().contains(&needle))
            .collect::<Vec<_>>();
        info!(
            "event=task_filter module=service status=ok mode=query count={}",
            hits.len()
        );
        Ok(hits)
    }

    fn check_index(&self, index: Option<usize>) -> TaskStoreResult<usize> {
        match index {
            Some(value) if value < self.tasks.len() => Ok(value),
            other => {
                warn!(
                    "event=task_index module=service status=error error_code=invalid_index len={}",
                    self.tasks.len()
                );
                Err(TaskStoreError::InvalidIndex {
                    index: other,
                    len: self.tasks.len(),
                })
            }
        }
    }

    fn persist(&self) -> TaskStoreResult<()> {
        Ok(self.repo.save(&self.tasks)?)
    }
}

fn require_text(text: &str) -> TaskStoreResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        warn!("event=task_input module=service status=error error_code=blank_text");
        return Err(TaskStoreError::BlankText);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{TaskStore, TaskStoreError};
    use crate::model::task::Task;
    use crate::repo::task_file::{RepoResult, TaskRepository};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryRepo {
        saved: RefCell<Vec<Task>>,
        saves: RefCell<usize>,
    }

    impl TaskRepository for MemoryRepo {
        fn load(&self) -> RepoResult<Vec<Task>> {
            Ok(self.saved.borrow().clone())
        }

        fn save(&self, tasks: &[Task]) -> RepoResult<()> {
            *self.saved.borrow_mut() = tasks.to_vec();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn every_mutation_saves_once() {
        let mut store = TaskStore::new(MemoryRepo::default());
        store.add("a").unwrap();
        store.schedule("b", "7:05").unwrap();
        store.toggle_completion(Some(0)).unwrap();
        store.remove(Some(1)).unwrap();
        assert_eq!(*store.repository().saves.borrow(), 4);
        assert_eq!(*store.repository().saved.borrow(), vec![Task::new("a", None, true)]);
    }

    #[test]
    fn rejected_input_does_not_save() {
        let mut store = TaskStore::new(MemoryRepo::default());
        assert!(matches!(store.add("  \t "), Err(TaskStoreError::BlankText)));
        assert!(matches!(store.schedule("", "9:30"), Err(TaskStoreError::BlankText)));
        assert!(matches!(
            store.toggle_completion(None),
            Err(TaskStoreError::InvalidIndex { index: None, len: 0 })
        ));
        assert_eq!(*store.repository().saves.borrow(), 0);
    }

    #[test]
    fn invalid_index_message_distinguishes_no_selection() {
        let none = TaskStoreError::InvalidIndex { index: None, len: 2 };
        let out_of_range = TaskStoreError::InvalidIndex {
            index: Some(5),
            len: 2,
        };
        assert_eq!(none.to_string(), "no task selected");
        assert!(out_of_range.to_string().contains("out of range"));
    }
}
