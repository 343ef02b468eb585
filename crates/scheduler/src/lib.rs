//! Periodic due-task scan.
//!
//! [`ReminderScheduler`] wakes on a fixed interval, dispatches every due
//! task's reminder and marks it notified so it never fires again.

pub mod metrics;
pub mod runner;

pub use metrics::SchedulerMetrics;
pub use runner::{ReminderScheduler, SchedulerHandle, TickReport};
