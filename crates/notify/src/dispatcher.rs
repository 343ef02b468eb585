//! Delivers one task's reminder across every applicable channel.
//!
//! Channels are attempted in a fixed order (desktop, email, SMS). Each is
//! independent: a failure is logged and recorded in the [`DispatchReport`]
//! and never prevents the next channel from being tried. Nothing is retried.

use std::time::{Duration, Instant};

use nudge_core::{EmailSettings, Task};

use crate::email::{MailerFactory, SmtpMailerFactory};
use crate::sms::SmsNotifier;
use crate::templating::TemplateRenderer;
use crate::traits::{DispatchReport, DispatchResult, Notification, Notifier, NotifyError};

/// Routes a due task to the desktop, email and SMS channels.
pub struct Dispatcher {
    desktop: Box<dyn Notifier>,
    mailer: Box<dyn MailerFactory>,
    renderer: TemplateRenderer,
}

impl Dispatcher {
    /// Create a dispatcher with an explicit desktop channel and mailer.
    pub fn new(desktop: Box<dyn Notifier>, mailer: Box<dyn MailerFactory>) -> Self {
        Self {
            desktop,
            mailer,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Create a dispatcher that sends email over SMTP with the given timeout.
    pub fn with_smtp(desktop: Box<dyn Notifier>, smtp_timeout: Duration) -> Self {
        Self::new(desktop, Box::new(SmtpMailerFactory::new(smtp_timeout)))
    }

    /// Deliver `task`'s reminder on every applicable channel.
    ///
    /// - desktop: always attempted
    /// - email: only when the task has an address and `settings` has credentials
    /// - sms: only when the task has a phone number (log-only placeholder)
    pub async fn dispatch(&self, task: &Task, settings: &EmailSettings) -> DispatchReport {
        let mut report = DispatchReport::default();

        let popup = Notification::new(task.title.clone(), task.description.clone())
            .with_task_id(&task.id);
        let desktop = self.deliver(self.desktop.as_ref(), &popup).await;
        report.desktop_ok = desktop.success;
        report.results.push(desktop);

        if task.has_email() && settings.is_configured() {
            report.email_attempted = true;
            let email = self.deliver_email(task, settings).await;
            report.email_ok = email.success;
            report.results.push(email);
        } else if task.has_email() {
            tracing::debug!(task_id = %task.id, "email settings incomplete, skipping email channel");
        }

        if task.has_phone() {
            let sms = SmsNotifier::new(task.phone.clone());
            let notification = Notification::new(task.title.clone(), task.description.clone())
                .with_task_id(&task.id);
            let result = self.deliver(&sms, &notification).await;
            report.sms_noted = result.success;
            report.results.push(result);
        }

        report
    }

    async fn deliver_email(&self, task: &Task, settings: &EmailSettings) -> DispatchResult {
        let start = Instant::now();
        let prepared = self.renderer.email_body(task).and_then(|body| {
            let notification =
                Notification::new(self.renderer.email_subject(task), body).with_task_id(&task.id);
            let channel = self.mailer.build(settings, &task.email)?;
            Ok((channel, notification))
        });

        match prepared {
            Ok((channel, notification)) => self.deliver(channel.as_ref(), &notification).await,
            Err(e) => failed("email", &task.id, &e, start),
        }
    }

    /// Send on one channel, timing and logging the outcome.
    async fn deliver(&self, channel: &dyn Notifier, notification: &Notification) -> DispatchResult {
        let task_id = notification.task_id();
        let start = Instant::now();
        let result = channel.send(notification).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, error) = match result {
            Ok(()) => {
                tracing::info!(
                    task_id,
                    channel = channel.channel_name(),
                    duration_ms,
                    "Reminder delivered"
                );
                (true, None)
            }
            Err(e) => {
                tracing::warn!(
                    task_id,
                    channel = channel.channel_name(),
                    error = %e,
                    duration_ms,
                    "Reminder delivery failed"
                );
                (false, Some(e.to_string()))
            }
        };

        DispatchResult {
            channel: channel.channel_name().to_string(),
            task_id: task_id.to_string(),
            success,
            error,
            duration_ms,
        }
    }
}

fn failed(channel: &str, task_id: &str, error: &NotifyError, start: Instant) -> DispatchResult {
    let duration_ms = start.elapsed().as_millis() as u64;
    tracing::warn!(task_id, channel, error = %error, duration_ms, "Reminder delivery failed");
    DispatchResult {
        channel: channel.to_string(),
        task_id: task_id.to_string(),
        success: false,
        error: Some(error.to_string()),
        duration_ms,
    }
}
