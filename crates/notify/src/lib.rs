//! Notification channels for due reminders.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Desktop popup, SMTP email, and SMS placeholder channels
//! - Minijinja template rendering for reminder emails
//! - Dispatcher that delivers one task's reminder across every applicable channel

pub mod desktop;
pub mod dispatcher;
pub mod email;
pub mod sms;
pub mod templating;
pub mod traits;

pub use desktop::{DesktopNotifier, Popup};
pub use dispatcher::Dispatcher;
pub use email::{test_connection, EmailNotifier, MailerFactory, SmtpMailerFactory};
pub use sms::SmsNotifier;
pub use traits::{DispatchReport, DispatchResult, Notification, Notifier, NotifyError};
