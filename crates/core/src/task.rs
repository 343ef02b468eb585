use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::DISPLAY_FORMAT;

/// Task identifier. Decimal string assigned from a monotonically
/// increasing counter.
pub type TaskId = String;

/// Descriptions longer than this are truncated in list views.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 50;

/// A reminder task. This is the only persisted entity.
///
/// `is_completed` doubles as the "notified" flag: the scheduler sets it
/// once a reminder has fired, and the user sets it (together with
/// clearing `is_active`) when completing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Local wall-clock due time.
    pub reminder_time: NaiveDateTime,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Task {
    /// Active, not yet notified, and due at or before `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.is_active && !self.is_completed && self.reminder_time <= now
    }

    pub fn status(&self) -> TaskStatus {
        if self.is_completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }

    pub fn has_phone(&self) -> bool {
        !self.phone.is_empty()
    }

    /// Due time as shown to the user and in email bodies.
    pub fn formatted_due(&self) -> String {
        self.reminder_time.format(DISPLAY_FORMAT).to_string()
    }

    /// Description cut to [`DESCRIPTION_PREVIEW_CHARS`] characters with a
    /// trailing `...` when longer.
    pub fn description_preview(&self) -> String {
        if self.description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
            let head: String = self
                .description
                .chars()
                .take(DESCRIPTION_PREVIEW_CHARS)
                .collect();
            format!("{head}...")
        } else {
            self.description.clone()
        }
    }
}

/// Status label shown in list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// User input for a new task, already parsed into a timestamp by the UI.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub reminder_time: Option<NaiveDateTime>,
    pub email: String,
    pub phone: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, reminder_time: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            reminder_time: Some(reminder_time),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }
}
