//! SMTP email notifier via `lettre` with TLS support.
//!
//! Each reminder opens a transient connection: connect, upgrade to TLS,
//! authenticate, send, close. Every step is bounded by a timeout so a hung
//! mail server cannot stall the scheduler beyond one tick.

use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use nudge_core::EmailSettings;

use crate::traits::{Notification, Notifier, NotifyError};

/// Port that expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox (the configured username).
    from: Mailbox,
    /// Recipient mailbox (the task's email).
    to: Mailbox,
    timeout: Duration,
}

/// Build an authenticated transport for the configured server.
fn build_transport(
    settings: &EmailSettings,
    timeout: Duration,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
    let host = settings.smtp_server.trim();
    if host.is_empty() {
        return Err(NotifyError::Config("SMTP server is required".to_string()));
    }

    // Port 465 uses implicit TLS; everything else uses STARTTLS.
    let builder = if settings.smtp_port == IMPLICIT_TLS_PORT {
        AsyncSmtpTransport::<Tokio1Executor>::relay(host)
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
    }
    .map_err(|e| NotifyError::Config(e.to_string()))?;

    Ok(builder
        .port(settings.smtp_port)
        .credentials(Credentials::new(
            settings.email_username.clone(),
            settings.email_password.clone(),
        ))
        .timeout(Some(timeout))
        .build())
}

impl EmailNotifier {
    /// Build an `EmailNotifier` that sends from the configured account to `to`.
    pub fn from_settings(
        settings: &EmailSettings,
        to: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        if !settings.is_configured() {
            return Err(NotifyError::Config(
                "email username and password are required".to_string(),
            ));
        }

        let from: Mailbox = settings
            .email_username
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;
        let to: Mailbox = to
            .trim()
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        Ok(Self {
            transport: build_transport(settings, timeout)?,
            from,
            to,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&notification.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tokio::time::timeout(self.timeout, self.transport.send(email))
            .await
            .map_err(|_| NotifyError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            task_id = %notification.task_id(),
            to = %self.to,
            "Email sent successfully"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}

/// Open a connection with `settings`, upgrade to TLS, authenticate, close.
pub async fn test_connection(settings: &EmailSettings, timeout: Duration) -> Result<(), NotifyError> {
    if !settings.is_configured() {
        return Err(NotifyError::Config(
            "email username and password are required".to_string(),
        ));
    }
    let transport = build_transport(settings, timeout)?;
    let connected = tokio::time::timeout(timeout, transport.test_connection())
        .await
        .map_err(|_| NotifyError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(|e| NotifyError::Smtp(e.to_string()))?;

    if connected {
        tracing::info!(server = %settings.smtp_server, port = settings.smtp_port, "SMTP connection test passed");
        Ok(())
    } else {
        Err(NotifyError::Smtp("server did not accept the connection".to_string()))
    }
}

/// Builds the email channel for one reminder.
///
/// The dispatcher calls this once per due task so every send gets a fresh
/// connection with the current settings.
pub trait MailerFactory: Send + Sync {
    fn build(&self, settings: &EmailSettings, to: &str) -> Result<Box<dyn Notifier>, NotifyError>;
}

/// Default factory producing lettre-backed [`EmailNotifier`]s.
#[derive(Debug, Clone)]
pub struct SmtpMailerFactory {
    timeout: Duration,
}

impl SmtpMailerFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl MailerFactory for SmtpMailerFactory {
    fn build(&self, settings: &EmailSettings, to: &str) -> Result<Box<dyn Notifier>, NotifyError> {
        Ok(Box::new(EmailNotifier::from_settings(settings, to, self.timeout)?))
    }
}
