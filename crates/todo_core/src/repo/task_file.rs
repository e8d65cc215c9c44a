//! Task repository contract and flat-file implementation.
//!
//! # Responsibility
//! - Encode/decode tasks as tab-separated lines.
//! - Load and replace the task file as a whole.
//!
//! # Invariants
//! - One task per line: `<1|0>\t<text>\t<HH:MM:SS or empty>`.
//! - Encoded text never contains tab or line-break characters.
//! - Decoding degrades per field instead of rejecting a line.
//! - A missing file loads as an empty list.

use crate::model::task::{truncate_to_minute, Task, TimeOfDay};
use chrono::NaiveTime;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

const FIELD_SEPARATOR: char = '\t';
const TAB_REPLACEMENT: &str = "  ";
const STORED_TIME_FORMAT: &str = "%H:%M:%S";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for task persistence.
#[derive(Debug)]
pub enum RepoError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RepoError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "task file `{}` I/O failed: {source}", path.display())
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Persistence contract used by `TaskStore`.
pub trait TaskRepository {
    /// Reads every persisted task in file order.
    fn load(&self) -> RepoResult<Vec<Task>>;
    /// Replaces persisted contents with `tasks`.
    fn save(&self, tasks: &[Task]) -> RepoResult<()>;
}

/// Flat text file holding one encoded task per line.
#[derive(Debug, Clone)]
pub struct FileTaskRepository {
    path: PathBuf,
}

impl FileTaskRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl TaskRepository for FileTaskRepository {
    fn load(&self) -> RepoResult<Vec<Task>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("event=tasks_load module=repo status=ok source=missing count=0");
                return Ok(Vec::new());
            }
            Err(err) => {
                error!("event=tasks_load module=repo status=error error={err}");
                return Err(RepoError::io(&self.path, err));
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let tasks = decode_lines(&content);
        info!(
            "event=tasks_load module=repo status=ok source=file count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = write_replacing(&self.path, self.parent_dir(), tasks);
        match &result {
            Ok(()) => info!(
                "event=tasks_save module=repo status=ok count={} duration_ms={}",
                tasks.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=tasks_save module=repo status=error count={} duration_ms={} error={err}",
                tasks.len(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

fn write_replacing(path: &Path, dir: &Path, tasks: &[Task]) -> RepoResult<()> {
    // Why: `persist` is a rename, which is only atomic within one filesystem,
    // so the temp file must live next to the target.
    let staged = NamedTempFile::new_in(dir).map_err(|err| RepoError::io(path, err))?;
    {
        let mut writer = BufWriter::new(staged.as_file());
        for task in tasks {
            writeln!(writer, "{}", encode_line(task)).map_err(|err| RepoError::io(path, err))?;
        }
        writer.flush().map_err(|err| RepoError::io(path, err))?;
    }
    staged
        .persist(path)
        .map_err(|err| RepoError::io(path, err.error))?;
    Ok(())
}

/// Encodes one task as a persisted line (without line terminator).
pub fn encode_line(task: &Task) -> String {
    let completed = if task.is_completed() { "1" } else { "0" };
    let text = task
        .text()
        .replace(FIELD_SEPARATOR, TAB_REPLACEMENT)
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ");
    let time = task
        .scheduled_time()
        .map(|time| time.format(STORED_TIME_FORMAT).to_string())
        .unwrap_or_default();
    format!("{completed}{FIELD_SEPARATOR}{text}{FIELD_SEPARATOR}{time}")
}

/// Decodes one persisted line, falling back to defaults per field.
///
/// - field 0 equal to `1` marks the task completed;
/// - missing field 1 yields empty text;
/// - missing, blank or unparseable field 2 yields no scheduled time.
pub fn decode_line(line: &str) -> Task {
    let mut fields = line.split(FIELD_SEPARATOR);
    let completed = fields.next() == Some("1");
    let text = fields.next().unwrap_or_default();
    let scheduled_time = fields.next().and_then(|raw| {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = parse_stored_time(raw);
        if parsed.is_none() {
            warn!("event=task_decode module=repo status=degraded field=time");
        }
        parsed
    });
    Task::new(text, scheduled_time, completed)
}

/// Decodes every non-blank line in order.
pub fn decode_lines(content: &str) -> Vec<Task> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(decode_line)
        .collect()
}

fn parse_stored_time(raw: &str) -> Option<TimeOfDay> {
    // Older files stored `HH:MM` when seconds were zero.
    // Why: reminders match whole minutes, so stray seconds would make a task
    // never due.
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .map(truncate_to_minute)
}

#[cfg(test)]
mod tests {
    use super::{decode_line, decode_lines, encode_line};
    use crate::model::task::Task;
    use chrono::NaiveTime;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn encode_uses_three_tab_separated_fields() {
        assert_eq!(encode_line(&Task::unscheduled("Buy milk")), "0\tBuy milk\t");
        assert_eq!(
            encode_line(&Task::new("Standup", Some(hm(9, 0)), true)),
            "1\tStandup\t09:00:00"
        );
    }

    #[test]
    fn encode_replaces_tabs_and_line_breaks() {
        let encoded = encode_line(&Task::unscheduled("a\tb\nc\r\nd"));
        assert_eq!(encoded, "0\ta  b c d\t");
        assert_eq!(encoded.matches('\t').count(), 2);
    }

    #[test]
    fn decode_tolerates_short_lines() {
        assert_eq!(decode_line("1"), Task::new("", None, true));
        assert_eq!(decode_line("0\tonly text"), Task::unscheduled("only text"));
    }

    #[test]
    fn decode_degrades_bad_time_to_unscheduled() {
        assert_eq!(decode_line("0\tx\tnot-a-time"), Task::unscheduled("x"));
        assert_eq!(decode_line("0\tx\t   "), Task::unscheduled("x"));
    }

    #[test]
    fn decode_accepts_legacy_precision_and_drops_seconds() {
        assert_eq!(decode_line("0\tx\t18:00").scheduled_time(), Some(hm(18, 0)));
        assert_eq!(
            decode_line("0\tx\t18:00:30.5").scheduled_time(),
            Some(hm(18, 0))
        );
    }

    #[test]
    fn decode_lines_skips_blank_lines_and_handles_crlf() {
        let tasks = decode_lines("0\ta\t\r\n\r\n   \n1\tb\t07:15:00\n");
        assert_eq!(
            tasks,
            vec![
                Task::unscheduled("a"),
                Task::new("b", Some(hm(7, 15)), true)
            ]
        );
    }
}
