//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task store operations and reminder delivery to Dart via FRB.
//! - Translate core errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - At most one session (one app context) is open per process; opening a
//!   different data directory replaces it and stops the old scanner.
//! - Reminder draining never blocks.

use log::{info, warn};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};
use todo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppContext, AppResult, CoreConfig, ReminderEvent, Task,
};

const NOT_OPEN_MESSAGE: &str = "task list is not open; call todo_open first";

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

struct Session {
    data_dir: PathBuf,
    app: AppContext,
    reminders: Receiver<ReminderEvent>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One task row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub text: String,
    /// `HH:MM` when scheduled.
    pub time: Option<String>,
    pub completed: bool,
    /// Plain label with completion mark and time suffix.
    pub label: String,
}

/// List response envelope for list/filter calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub items: Vec<TodoItem>,
    pub message: String,
}

/// Mutation response envelope; `items` is the list to re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    pub ok: bool,
    pub items: Vec<TodoItem>,
    pub message: String,
}

impl TodoActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// Reminder popup payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub text: String,
    pub time: Option<String>,
    pub message: String,
}

/// Opens the task list stored in `data_dir` and starts reminders.
///
/// # FFI contract
/// - Sync call; loads the task file and spawns the reminder thread.
/// - Re-opening the same directory is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_open(data_dir: String) -> TodoActionResponse {
    let trimmed = data_dir.trim();
    if trimmed.is_empty() {
        return TodoActionResponse::failure("todo_open failed: data_dir cannot be empty");
    }
    let data_dir = PathBuf::from(trimmed);

    let mut session = lock_session();
    if let Some(current) = session.as_ref() {
        if current.data_dir == data_dir {
            return action_from(&current.app, Ok(()), "Task list already open.");
        }
    }

    // Stop the previous scanner before a new one starts.
    session.take();
    match AppContext::open(&CoreConfig::in_dir(&data_dir)) {
        Ok((app, reminders)) => {
            info!("event=ffi_open module=ffi status=ok");
            let response = action_from(&app, Ok(()), "Task list opened.");
            *session = Some(Session {
                data_dir,
                app,
                reminders,
            });
            response
        }
        Err(err) => TodoActionResponse::failure(format!("todo_open failed: {err}")),
    }
}

/// Returns current in-memory tasks.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> TodoListResponse {
    with_session_list(|app| app.tasks(), "todo_list")
}

/// Adds a task from the input field.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(text: String) -> TodoActionResponse {
    with_session_action(|app| app.add(&text), "Task added.", "todo_add")
}

/// Removes the selected task; `None` means nothing is selected.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_remove(index: Option<u32>) -> TodoActionResponse {
    with_session_action(
        |app| app.remove(to_position(index)).map(|_| ()),
        "Task removed.",
        "todo_remove",
    )
}

/// Toggles completion of the selected task.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle(index: Option<u32>) -> TodoActionResponse {
    with_session_action(
        |app| app.toggle_completion(to_position(index)).map(|_| ()),
        "Task updated.",
        "todo_toggle",
    )
}

/// Adds a task scheduled at `time` (`H:MM`, 24-hour).
#[flutter_rust_bridge::frb(sync)]
pub fn todo_schedule(text: String, time: String) -> TodoActionResponse {
    with_session_action(
        |app| app.schedule(&text, &time),
        "Task scheduled.",
        "todo_schedule",
    )
}

/// Searches persisted tasks; blank query refreshes the full list.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_filter(query: String) -> TodoListResponse {
    with_session_list(|app| app.filter(&query), "todo_filter")
}

/// Returns reminders emitted since the previous call.
///
/// # FFI contract
/// - Sync call, non-blocking; returns an empty list when nothing is pending
///   or no session is open.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_drain_reminders() -> Vec<ReminderItem> {
    let session = lock_session();
    let Some(session) = session.as_ref() else {
        return Vec::new();
    };
    session
        .reminders
        .try_iter()
        .map(to_reminder_item)
        .collect()
}

fn lock_session() -> MutexGuard<'static, Option<Session>> {
    SESSION.lock().unwrap_or_else(|poisoned| {
        warn!("event=ffi_session module=ffi status=degraded error_code=lock_poisoned");
        poisoned.into_inner()
    })
}

fn with_session_action(
    f: impl FnOnce(&AppContext) -> AppResult<()>,
    success_message: &str,
    operation: &str,
) -> TodoActionResponse {
    let session = lock_session();
    let Some(session) = session.as_ref() else {
        return TodoActionResponse::failure(format!("{operation} failed: {NOT_OPEN_MESSAGE}"));
    };
    let result = f(&session.app).map_err(|err| format!("{operation} failed: {err}"));
    action_from(&session.app, result, success_message)
}

fn with_session_list(
    f: impl FnOnce(&AppContext) -> AppResult<Vec<Task>>,
    operation: &str,
) -> TodoListResponse {
    let session = lock_session();
    let Some(session) = session.as_ref() else {
        return TodoListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {NOT_OPEN_MESSAGE}"),
        };
    };
    match f(&session.app) {
        Ok(tasks) => {
            let message = if tasks.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("{} task(s).", tasks.len())
            };
            TodoListResponse {
                ok: true,
                items: tasks.iter().map(to_todo_item).collect(),
                message,
            }
        }
        Err(err) => TodoListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {err}"),
        },
    }
}

/// Builds a response carrying the current list even when the call failed,
/// so the UI can re-render what memory holds after a failed save.
fn action_from(
    app: &AppContext,
    result: Result<(), String>,
    success_message: &str,
) -> TodoActionResponse {
    let items: Vec<TodoItem> = app
        .tasks()
        .map(|tasks| tasks.iter().map(to_todo_item).collect())
        .unwrap_or_default();
    match result {
        Ok(()) => TodoActionResponse {
            ok: true,
            items,
            message: success_message.to_string(),
        },
        Err(message) => TodoActionResponse {
            ok: false,
            items,
            message,
        },
    }
}

fn to_position(index: Option<u32>) -> Option<usize> {
    index.and_then(|value| usize::try_from(value).ok())
}

fn to_todo_item(task: &Task) -> TodoItem {
    TodoItem {
        text: task.text().to_string(),
        time: task
            .scheduled_time()
            .map(|time| time.format("%H:%M").to_string()),
        completed: task.is_completed(),
        label: task.display_label(),
    }
}

fn to_reminder_item(event: ReminderEvent) -> ReminderItem {
    ReminderItem {
        message: event.message(),
        time: event.time.map(|time| time.format("%H:%M").to_string()),
        text: event.text,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, todo_add, todo_drain_reminders, todo_filter, todo_list,
        todo_open, todo_remove, todo_schedule, todo_toggle,
    };
    use std::sync::{Mutex, MutexGuard};

    // The FFI session is process-wide; serialize tests that open it.
    static TEST_GUARD: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        TEST_GUARD.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_temp() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp data dir");
        let response = todo_open(dir.path().to_str().expect("utf-8 path").to_string());
        assert!(response.ok, "{}", response.message);
        dir
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn todo_open_rejects_blank_dir() {
        let response = todo_open("   ".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("data_dir"));
    }

    #[test]
    fn add_toggle_remove_flow_returns_rerender_items() {
        let _guard = serial();
        let _dir = open_temp();

        let added = todo_add("Buy milk".to_string());
        assert!(added.ok, "{}", added.message);
        let scheduled = todo_schedule("Standup".to_string(), "9:00".to_string());
        assert!(scheduled.ok, "{}", scheduled.message);
        assert_eq!(scheduled.items.len(), 2);
        assert_eq!(scheduled.items[1].time.as_deref(), Some("09:00"));
        assert_eq!(scheduled.items[1].label, "Standup [09:00]");

        let toggled = todo_toggle(Some(0));
        assert!(toggled.ok, "{}", toggled.message);
        assert!(toggled.items[0].completed);
        assert_eq!(toggled.items[0].label, "✔ Buy milk");

        let removed = todo_remove(Some(0));
        assert!(removed.ok, "{}", removed.message);
        assert_eq!(todo_list().items.len(), 1);
    }

    #[test]
    fn invalid_inputs_return_failure_envelopes() {
        let _guard = serial();
        let _dir = open_temp();

        let blank = todo_add("   ".to_string());
        assert!(!blank.ok);
        assert!(blank.message.contains("empty"));

        let bad_time = todo_schedule("Meeting".to_string(), "25:00".to_string());
        assert!(!bad_time.ok);
        assert!(bad_time.message.contains("invalid time format"));

        let no_selection = todo_remove(None);
        assert!(!no_selection.ok);
        assert!(no_selection.message.contains("no task selected"));
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let _guard = serial();
        let _dir = open_temp();
        assert!(todo_add("Buy milk".to_string()).ok);
        assert!(todo_add("Call mom".to_string()).ok);

        let response = todo_filter("MO".to_string());
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].text, "Call mom");

        assert_eq!(todo_filter(String::new()).items.len(), 2);
    }

    #[test]
    fn reopening_same_dir_keeps_session() {
        let _guard = serial();
        let dir = open_temp();
        assert!(todo_add("persisted".to_string()).ok);

        let again = todo_open(dir.path().to_str().expect("utf-8 path").to_string());
        assert!(again.ok);
        assert_eq!(again.message, "Task list already open.");
        assert_eq!(again.items.len(), 1);
    }

    #[test]
    fn drain_reminders_is_non_blocking() {
        let _guard = serial();
        let _dir = open_temp();
        assert!(todo_add("unscheduled".to_string()).ok);
        assert!(todo_drain_reminders().is_empty());
    }
}
