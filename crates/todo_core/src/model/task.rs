//! Task domain model.
//!
//! # Responsibility
//! - Define the to-do record rendered by the presentation layer.
//! - Parse user-entered `H:MM` schedule times.
//!
//! # Invariants
//! - Fields are private; a `Task` never changes after construction.
//! - `scheduled_time` carries no date and no timezone.
//! - Tasks created through the store have non-blank, trimmed `text`.

use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Local wall-clock time of day used for reminders.
pub type TimeOfDay = NaiveTime;

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid clock time regex"));

/// One to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    text: String,
    scheduled_time: Option<TimeOfDay>,
    completed: bool,
}

impl Task {
    /// Creates a task value as-is.
    ///
    /// No validation happens here: persisted lines may legitimately decode to
    /// an empty text. User input goes through `TaskStore` which rejects blanks.
    pub fn new(text: impl Into<String>, scheduled_time: Option<TimeOfDay>, completed: bool) -> Self {
        Self {
            text: text.into(),
            scheduled_time,
            completed,
        }
    }

    /// Creates an incomplete, unscheduled task.
    pub fn unscheduled(text: impl Into<String>) -> Self {
        Self::new(text, None, false)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn scheduled_time(&self) -> Option<TimeOfDay> {
        self.scheduled_time
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns a copy with the completion flag negated.
    pub fn toggled(&self) -> Self {
        Self {
            text: self.text.clone(),
            scheduled_time: self.scheduled_time,
            completed: !self.completed,
        }
    }

    /// Whether a reminder for this task is due at `minute`.
    ///
    /// Matching is exact: a task whose time has already passed is not due.
    pub fn is_due_at(&self, minute: TimeOfDay) -> bool {
        !self.completed && self.scheduled_time == Some(minute)
    }

    /// Plain list label: `✔ ` prefix when completed, ` [HH:MM]` suffix when
    /// scheduled. Styling (strikethrough, colors) belongs to the renderer.
    pub fn display_label(&self) -> String {
        let mut label = String::with_capacity(self.text.len() + 12);
        if self.completed {
            label.push_str("✔ ");
        }
        label.push_str(&self.text);
        if let Some(time) = self.scheduled_time {
            label.push_str(&format!(" [{}]", time.format("%H:%M")));
        }
        label
    }
}

/// Parses a 24-hour clock value such as `18:00` or `9:30`.
///
/// Hour may have one or two digits (0-23), minute must have two (00-59).
/// Surrounding whitespace is ignored. Returns `None` for anything else.
pub fn parse_time_of_day(input: &str) -> Option<TimeOfDay> {
    let caps = CLOCK_TIME_RE.captures(input.trim())?;
    let hour = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let minute = caps.get(2)?.as_str().parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Truncates a time to its whole minute.
pub fn truncate_to_minute(time: TimeOfDay) -> TimeOfDay {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
