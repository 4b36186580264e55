//! Error types for card monitoring

use crate::status::StatusCode;

/// Errors returned by the monitor API
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The session was already started
    #[error("Monitor already started")]
    AlreadyStarted,

    /// The poll thread could not be spawned
    #[error("Failed to spawn poll thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Resource manager failure
    #[error("Resource manager error: {0}")]
    Status(StatusCode),
}

impl From<StatusCode> for MonitorError {
    fn from(status: StatusCode) -> Self {
        Self::Status(status)
    }
}
