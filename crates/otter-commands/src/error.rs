use otter_core::OtterError;
use otter_scheduler::SchedulerError;
use thiserror::Error;

/// Failure of a single command invocation.
///
/// `Display` is what the user sees, so upstream variants render a fixed
/// message and keep the detail for the logs.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad or unresolvable user input, shown verbatim.
    #[error("{0}")]
    Usage(String),

    #[error("{message}")]
    Http {
        message: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Upstream { message: &'static str, status: u16 },

    #[error("minecraft server unavailable")]
    Rcon { detail: String },

    #[error("{}", reminder_text(.0))]
    Reminder(#[from] SchedulerError),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("request timed out")]
    Timeout { ms: u64 },

    #[error("platform request failed")]
    Platform(#[from] OtterError),
}

fn reminder_text(err: &SchedulerError) -> String {
    match err {
        SchedulerError::NoInterval | SchedulerError::InvalidInterval(_) => err.to_string(),
        _ => "reminder store unavailable".to_string(),
    }
}

impl CommandError {
    pub fn usage(msg: impl Into<String>) -> Self {
        CommandError::Usage(msg.into())
    }

    /// Timeouts and transport failures could succeed if the user tries again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CommandError::Timeout { .. } | CommandError::Rcon { .. } => true,
            CommandError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            CommandError::Upstream { status, .. } => *status >= 500 || *status == 429,
            CommandError::Reminder(e) => e.is_retryable(),
            CommandError::Platform(e) => e.is_retryable(),
            CommandError::Usage(_) | CommandError::NotConfigured(_) | CommandError::Config(_) => false,
        }
    }

    /// Internal detail worth logging alongside the user-facing text.
    pub fn detail(&self) -> String {
        match self {
            CommandError::Http { source, .. } => source.to_string(),
            CommandError::Upstream { status, .. } => format!("status {status}"),
            CommandError::Rcon { detail } => detail.clone(),
            CommandError::Reminder(e) => e.to_string(),
            CommandError::Platform(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_input_errors_pass_through() {
        let err = CommandError::from(SchedulerError::NoInterval);
        assert_eq!(err.to_string(), "No interval specified");
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_errors_are_masked() {
        let err = CommandError::from(SchedulerError::Timeout { ms: 10_000 });
        assert_eq!(err.to_string(), "reminder store unavailable");
        assert!(err.is_retryable());
        assert!(err.detail().contains("10000"));
    }

    #[test]
    fn rcon_detail_stays_out_of_display() {
        let err = CommandError::Rcon {
            detail: "connection refused 10.0.0.4:25575".to_string(),
        };
        assert_eq!(err.to_string(), "minecraft server unavailable");
        assert!(err.detail().contains("10.0.0.4"));
    }

    #[test]
    fn upstream_retry_classification() {
        let busy = CommandError::Upstream {
            message: "error getting cat fact",
            status: 503,
        };
        let gone = CommandError::Upstream {
            message: "error getting cat fact",
            status: 404,
        };
        assert!(busy.is_retryable());
        assert!(!gone.is_retryable());
    }
}
