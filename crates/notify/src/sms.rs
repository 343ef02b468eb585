//! SMS placeholder channel.
//!
//! No SMS gateway is integrated. The channel only records the intent in
//! the log so the user can see a text would have been sent.

use crate::traits::{Notification, Notifier, NotifyError};

/// Logs the reminder that would be texted to `phone`.
#[derive(Debug, Clone)]
pub struct SmsNotifier {
    phone: String,
}

impl SmsNotifier {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
        }
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

#[async_trait::async_trait]
impl Notifier for SmsNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.phone.is_empty() {
            return Err(NotifyError::Config("no phone number".to_string()));
        }
        tracing::info!(
            channel = "sms",
            task_id = %notification.task_id(),
            phone = %self.phone,
            "SMS reminder to {}: {}",
            self.phone,
            notification.subject
        );
        Ok(())
    }

    /// Returns `"sms"`.
    fn channel_name(&self) -> &str {
        "sms"
    }
}
