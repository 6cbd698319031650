use thiserror::Error;

#[derive(Debug, Error)]
pub enum OtterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Member not found: {user_id} in guild {guild_id}")]
    MemberNotFound { guild_id: u64, user_id: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },
}

impl OtterError {
    /// Whether retrying the same call later could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OtterError::Timeout { .. } | OtterError::Platform(_))
    }
}

pub type Result<T> = std::result::Result<T, OtterError>;
