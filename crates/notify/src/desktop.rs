//! On-screen popup channel.
//!
//! The notifier does not draw anything itself: it pushes a [`Popup`] onto
//! an unbounded channel that the UI layer drains and renders. A dropped
//! receiver means no UI is attached, which is reported as a delivery
//! failure and never blocks the other channels.

use tokio::sync::mpsc;

use crate::traits::{Notification, Notifier, NotifyError};

/// A reminder popup for the UI to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub task_id: String,
    pub title: String,
    pub body: String,
}

impl Popup {
    /// Text as presented to the user.
    pub fn message(&self) -> String {
        if self.body.is_empty() {
            format!("Reminder: {}", self.title)
        } else {
            format!("Reminder: {}\n\n{}", self.title, self.body)
        }
    }
}

/// Sends reminders to the UI as popups.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    tx: mpsc::UnboundedSender<Popup>,
}

impl DesktopNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Popup>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiver the UI should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Popup>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let popup = Popup {
            task_id: notification.task_id().to_string(),
            title: notification.subject.clone(),
            body: notification.body.clone(),
        };
        self.tx
            .send(popup)
            .map_err(|_| NotifyError::ChannelUnavailable("no UI attached".to_string()))?;

        tracing::debug!(
            channel = "desktop",
            task_id = %notification.task_id(),
            "popup queued"
        );
        Ok(())
    }

    /// Returns `"desktop"`.
    fn channel_name(&self) -> &str {
        "desktop"
    }
}
