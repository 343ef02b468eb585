//! Notifier trait definition and shared result types.

use std::collections::HashMap;

use nudge_core::NudgeError;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("Timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl NotifyError {
    /// Wrap as a domain delivery error for the given channel.
    pub fn into_delivery(self, channel: &str) -> NudgeError {
        NudgeError::Delivery {
            channel: channel.to_string(),
            message: self.to_string(),
        }
    }
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    /// The rendered subject/title.
    pub subject: String,
    /// The rendered body content.
    pub body: String,
    /// Additional metadata (e.g., task id).
    pub metadata: HashMap<String, String>,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_task_id(mut self, task_id: &str) -> Self {
        self.metadata
            .insert("task_id".to_string(), task_id.to_string());
        self
    }

    pub fn task_id(&self) -> &str {
        self.metadata.get("task_id").map(String::as_str).unwrap_or("")
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "desktop", "email").
    fn channel_name(&self) -> &str;
}

/// Result of delivering a reminder on a single channel.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub channel: String,
    pub task_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Per-channel outcome of dispatching one task's reminder.
///
/// Every channel is reported independently; a failure on one channel never
/// prevents the others from being attempted.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub desktop_ok: bool,
    pub email_attempted: bool,
    pub email_ok: bool,
    pub sms_noted: bool,
    pub results: Vec<DispatchResult>,
}

impl DispatchReport {
    /// Results for channels that failed.
    pub fn failures(&self) -> impl Iterator<Item = &DispatchResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}
