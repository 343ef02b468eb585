//! Application facade used by the terminal UI.
//!
//! [`ReminderService`] owns the stores, the dispatcher and the scheduler
//! and exposes the handful of operations the UI needs.

mod service;

pub use service::ReminderService;

pub use nudge_notify::{DispatchReport, Popup};
pub use nudge_scheduler::{SchedulerHandle, SchedulerMetrics, TickReport};
