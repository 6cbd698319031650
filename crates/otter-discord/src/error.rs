use otter_core::OtterError;

/// Errors produced by the Discord adapter.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("no bot token configured")]
    NoToken,

    #[error("invalid {kind} id 0")]
    ZeroId { kind: &'static str },
}

impl From<DiscordError> for OtterError {
    fn from(e: DiscordError) -> Self {
        OtterError::Platform(e.to_string())
    }
}
