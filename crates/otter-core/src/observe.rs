//! Optional observation hook for command handling.
//!
//! Components take an `Arc<dyn Observer>`; none of the routing or reminder
//! logic depends on an observer being present.

use tracing::{debug, info, warn};

/// Lifecycle points of a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    Received { command: String, author_id: u64 },
    Unknown { command: String },
    RolesUnavailable { author_id: u64, reason: String },
    Denied { command: String, flag: String },
    Completed { command: String, elapsed_ms: u64 },
    Failed { command: String, error: String },
    ReminderDelivered { reminder_id: i64, channel_id: u64 },
    ReminderFailed { reminder_id: i64, error: String },
}

pub trait Observer: Send + Sync {
    fn record(&self, event: &CommandEvent);
}

/// Discards every event.
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record(&self, _event: &CommandEvent) {}
}

/// Emits every event as a structured `tracing` record.
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn record(&self, event: &CommandEvent) {
        match event {
            CommandEvent::Received { command, author_id } => {
                debug!(%command, author_id, "command received")
            }
            CommandEvent::Unknown { command } => debug!(%command, "unknown command ignored"),
            CommandEvent::RolesUnavailable { author_id, reason } => {
                warn!(author_id, %reason, "member roles unavailable, gated commands denied")
            }
            CommandEvent::Denied { command, flag } => {
                info!(%command, %flag, "command not allowed")
            }
            CommandEvent::Completed {
                command,
                elapsed_ms,
            } => info!(%command, elapsed_ms, "command completed"),
            CommandEvent::Failed { command, error } => warn!(%command, %error, "command failed"),
            CommandEvent::ReminderDelivered {
                reminder_id,
                channel_id,
            } => info!(reminder_id, channel_id, "reminder delivered"),
            CommandEvent::ReminderFailed { reminder_id, error } => {
                warn!(reminder_id, %error, "reminder delivery failed")
            }
        }
    }
}
