//! Task and settings persistence.
//!
//! - [`TaskStore`]: ordered in-memory task collection with a JSON snapshot
//! - [`SettingsStore`]: email settings file
//! - [`SharedTaskStore`]: the single lock shared by the UI and scheduler
//! - [`DataDirLock`]: one process per data directory

mod dir_lock;
mod error;
mod settings_store;
mod snapshot;
mod task_store;

pub use dir_lock::DataDirLock;
pub use error::StoreError;
pub use settings_store::SettingsStore;
pub use task_store::{LoadReport, SharedTaskStore, TaskStore};
