//! Periodic reminder scanner.
//!
//! # Responsibility
//! - Tick on a background thread at a fixed rate, first tick immediately.
//! - Emit one `ReminderEvent` per incomplete task scheduled at the current
//!   minute.
//!
//! # Invariants
//! - Store access happens only under the shared store lock, and the lock is
//!   released before events are sent.
//! - Sending never blocks; a closed receiver does not stop the schedule.
//! - At most one worker thread exists per scanner; `start` replaces it.
//! - `stop` must not be called while holding the store lock.

use crate::model::task::{truncate_to_minute, Task, TimeOfDay};
use crate::repo::task_file::TaskRepository;
use crate::service::task_store::SharedTaskStore;
use chrono::Local;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const WORKER_THREAD_NAME: &str = "todo-reminders";

/// Shortest accepted tick interval; smaller values are raised to it.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(10);

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeOfDay;
}

/// System local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> TimeOfDay {
        Local::now().time()
    }
}

/// Notification payload delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub text: String,
    pub time: Option<TimeOfDay>,
}

impl ReminderEvent {
    /// Popup message, e.g. `Reminder: Standup at 09:00`.
    pub fn message(&self) -> String {
        match self.time {
            Some(time) => format!("Reminder: {} at {}", self.text, time.format("%H:%M")),
            None => format!("Reminder: {}", self.text),
        }
    }
}

/// Whether a task may fire more than once inside its matching minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPolicy {
    /// Fire on every tick while the minute matches.
    #[default]
    EveryTick,
    /// Fire once per task per matching minute.
    OncePerMinute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Stopped,
    Running,
}

#[derive(Debug)]
pub enum ScannerError {
    Spawn(std::io::Error),
}

impl Display for ScannerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn reminder thread: {err}"),
        }
    }
}

impl Error for ScannerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
        }
    }
}

/// Returns reminders due at `now`, compared at whole-minute granularity.
pub fn due_reminders(tasks: &[Task], now: TimeOfDay) -> Vec<ReminderEvent> {
    let minute = truncate_to_minute(now);
    tasks
        .iter()
        .filter(|task| task.is_due_at(minute))
        .map(|task| ReminderEvent {
            text: task.text().to_string(),
            time: task.scheduled_time(),
        })
        .collect()
}

/// Reminders already delivered during the current minute.
///
/// Keyed by `(text, time, occurrence)` rather than list position, so removing
/// an earlier task does not re-fire the ones after it. `occurrence` counts
/// identical due tasks within one tick; two equal tasks fire twice.
#[derive(Default)]
struct NotifiedMarks {
    minute: Option<TimeOfDay>,
    fired: HashSet<(String, Option<TimeOfDay>, usize)>,
}

impl NotifiedMarks {
    /// Drops events already delivered this minute and records the rest.
    fn admit(&mut self, minute: TimeOfDay, due: Vec<ReminderEvent>) -> Vec<ReminderEvent> {
        if self.minute != Some(minute) {
            self.minute = Some(minute);
            self.fired.clear();
        }
        let mut occurrences: HashMap<(String, Option<TimeOfDay>), usize> = HashMap::new();
        due.into_iter()
            .filter(|event| {
                let seen = occurrences
                    .entry((event.text.clone(), event.time))
                    .or_insert(0);
                let key = (event.text.clone(), event.time, *seen);
                *seen += 1;
                self.fired.insert(key)
            })
            .collect()
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Background scanner reading a shared task store.
pub struct ReminderScanner<R: TaskRepository + Send + 'static> {
    store: SharedTaskStore<R>,
    clock: Arc<dyn Clock>,
    sink: Sender<ReminderEvent>,
    interval: Duration,
    policy: ReminderPolicy,
    worker: Option<Worker>,
}

impl<R: TaskRepository + Send + 'static> ReminderScanner<R> {
    /// Creates a stopped scanner using local time, plus the receiver that
    /// reminder events arrive on.
    pub fn new(
        store: SharedTaskStore<R>,
        interval: Duration,
        policy: ReminderPolicy,
    ) -> (Self, Receiver<ReminderEvent>) {
        Self::with_clock(store, interval, policy, Arc::new(LocalClock))
    }

    /// Creates a stopped scanner with a caller-provided clock.
    pub fn with_clock(
        store: SharedTaskStore<R>,
        interval: Duration,
        policy: ReminderPolicy,
        clock: Arc<dyn Clock>,
    ) -> (Self, Receiver<ReminderEvent>) {
        let (sink, events) = mpsc::channel();
        let scanner = Self {
            store,
            clock,
            sink,
            interval: interval.max(MIN_SCAN_INTERVAL),
            policy,
            worker: None,
        };
        (scanner, events)
    }

    /// Effective tick interval, never below [`MIN_SCAN_INTERVAL`].
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> ScannerState {
        if self.worker.is_some() {
            ScannerState::Running
        } else {
            ScannerState::Stopped
        }
    }

    /// Starts ticking immediately; a running worker is stopped and replaced.
    pub fn start(&mut self) -> Result<(), ScannerError> {
        self.stop();

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let sink = self.sink.clone();
        let interval = self.interval;
        let policy = self.policy;

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(&store, clock.as_ref(), &sink, interval, policy, &stop_rx))
            .map_err(|err| {
                error!("event=reminder_start module=reminder status=error error={err}");
                ScannerError::Spawn(err)
            })?;

        self.worker = Some(Worker { stop_tx, handle });
        info!(
            "event=reminder_start module=reminder status=ok interval_ms={} policy={:?}",
            interval.as_millis(),
            policy
        );
        Ok(())
    }

    /// Stops the worker and waits for it to exit. No-op when stopped.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            error!("event=reminder_stop module=reminder status=error error_code=worker_panicked");
            return;
        }
        info!("event=reminder_stop module=reminder status=ok");
    }
}

impl<R: TaskRepository + Send + 'static> Drop for ReminderScanner<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<R: TaskRepository>(
    store: &SharedTaskStore<R>,
    clock: &dyn Clock,
    sink: &Sender<ReminderEvent>,
    interval: Duration,
    policy: ReminderPolicy,
    stop_rx: &Receiver<()>,
) {
    let started_at = Instant::now();
    let mut marks = NotifiedMarks::default();
    let mut ticks: u32 = 0;

    loop {
        run_tick(store, clock, sink, policy, &mut marks);
        ticks = ticks.saturating_add(1);

        // Fixed rate: the next deadline does not drift with tick duration.
        let next_tick = interval.saturating_mul(ticks);
        let wait = next_tick.saturating_sub(started_at.elapsed());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn run_tick<R: TaskRepository>(
    store: &SharedTaskStore<R>,
    clock: &dyn Clock,
    sink: &Sender<ReminderEvent>,
    policy: ReminderPolicy,
    marks: &mut NotifiedMarks,
) {
    let minute = truncate_to_minute(clock.now());
    let due = {
        let guard = match store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event=reminder_tick module=reminder status=degraded error_code=lock_poisoned");
                poisoned.into_inner()
            }
        };
        due_reminders(guard.tasks(), minute)
    };
    // Why: the guard is dropped above so a slow receiver never holds the store
    // lock against foreground callers.
    let due = match policy {
        ReminderPolicy::EveryTick => due,
        ReminderPolicy::OncePerMinute => marks.admit(minute, due),
    };

    let mut sent = 0usize;
    for event in due {
        if sink.send(event).is_err() {
            warn!("event=reminder_emit module=reminder status=error error_code=receiver_closed");
            continue;
        }
        sent += 1;
    }

    debug!(
        "event=reminder_tick module=reminder status=ok minute={} sent={sent}",
        minute.format("%H:%M")
    );
}
