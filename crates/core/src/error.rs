use thiserror::Error;

#[derive(Error, Debug)]
pub enum NudgeError {
    /// Bad user input. Nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    /// Snapshot read/write failure. In-memory state is not rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Delivery via {channel} failed: {message}")]
    Delivery { channel: String, message: String },
}

impl NudgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors that should be shown to the user as a warning
    /// rather than an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, NudgeError>;
