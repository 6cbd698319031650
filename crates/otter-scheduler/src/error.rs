use thiserror::Error;

/// Errors that can occur within the reminder subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The reminder text carried no `<count><unit>` token.
    #[error("No interval specified")]
    NoInterval,

    /// A duration token was found but cannot be applied.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// A store round trip exceeded its deadline.
    #[error("Reminder store timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The blocking store task panicked or was cancelled.
    #[error("Reminder store task failed: {0}")]
    Task(String),

    /// Delivery or lookup through the messaging platform failed.
    #[error("Platform error: {0}")]
    Platform(#[from] otter_core::OtterError),
}

impl SchedulerError {
    /// Timeouts and lock contention are worth retrying on the next tick.
    pub fn is_retryable(&self) -> bool {
        match self {
            SchedulerError::Timeout { .. } => true,
            SchedulerError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            SchedulerError::Platform(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
