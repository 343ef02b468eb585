use nudge_core::NudgeError;
use thiserror::Error;

/// Errors produced by [`TaskStore`](crate::TaskStore) and
/// [`SettingsStore`](crate::SettingsStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Data directory {} is in use by another nudge process", .0.display())]
    DataDirInUse(std::path::PathBuf),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
    #[error(transparent)]
    Domain(#[from] NudgeError),
}

impl From<StoreError> for NudgeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Domain(inner) => inner,
            other => NudgeError::Persistence(other.to_string()),
        }
    }
}
