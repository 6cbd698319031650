use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use otter_core::Platform;
use tracing::{info, warn};

use crate::error::Result;
use crate::schedule::compute_due;
use crate::store::ReminderStore;
use crate::timeexpr::parse_duration;
use crate::types::Reminder;

pub const REMINDER_ADDED: &str = "Reminder added.";
pub const NO_REMAINING: &str = "No remaining reminders";

const HELP: &str = "RemindMe Help:
Will mention the creator near the specified time with the requested message.
Supports (m)inutes, (h/H)ours, (d/D)ays, or (M)onths

e.g. !remindme post memes 1h

List outstanding reminders using either:
!remindme list
for all reminders created by you on this server
!remindme list all
for all reminders created on this server by all users";

/// Everything needed to turn a "remind me" message into a [`Reminder`].
#[derive(Debug, Clone)]
pub struct ReminderRequest {
    /// Argument text after the command name, e.g. `post memes 1h`.
    pub text: String,
    pub server: u64,
    pub creator: u64,
    pub channel: u64,
    pub source_message: u64,
    pub source_timestamp: DateTime<Utc>,
}

/// Which creators a `list` covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Mine,
    All,
}

/// Build the reminder described by `request` without persisting it.
pub fn parse_reminder(request: &ReminderRequest) -> Result<Reminder> {
    let parsed = parse_duration(&request.text)?;
    let due = compute_due(request.source_timestamp, parsed.count, parsed.unit)?;
    Ok(Reminder {
        due,
        message: parsed.residual,
        server: request.server,
        creator: request.creator,
        channel: request.channel,
        source_message: request.source_message,
        source_timestamp: request.source_timestamp,
    })
}

/// Create and list reminders on behalf of chat commands.
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
}

impl ReminderService {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Self { store }
    }

    pub fn help_text() -> &'static str {
        HELP
    }

    /// Parse, persist and acknowledge a reminder.
    pub async fn create(&self, request: &ReminderRequest) -> Result<String> {
        let reminder = parse_reminder(request)?;
        let id = self.store.insert(&reminder).await?;
        info!(
            reminder_id = id,
            server = reminder.server,
            creator = reminder.creator,
            due = %reminder.due,
            "reminder created"
        );
        Ok(REMINDER_ADDED.to_string())
    }

    /// Render the outstanding reminders on `server`.
    ///
    /// Creator names are resolved through `platform`; a failed lookup falls
    /// back to the raw id instead of failing the whole listing.
    pub async fn list(
        &self,
        platform: &dyn Platform,
        server: u64,
        creator: u64,
        scope: ListScope,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let filter = match scope {
            ListScope::Mine => Some(creator),
            ListScope::All => None,
        };
        let pending = self.store.upcoming(server, filter, now).await?;
        if pending.is_empty() {
            return Ok(NO_REMAINING.to_string());
        }

        let mut out = String::new();
        for stored in &pending {
            let r = &stored.reminder;
            let name = match platform.member_name(r.server, r.creator).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(creator = r.creator, error = %e, "member name lookup failed");
                    r.creator.to_string()
                }
            };
            let _ = writeln!(
                out,
                "From: {} Due: {} Message: {}",
                name,
                r.due.to_rfc3339_opts(SecondsFormat::Secs, true),
                r.message
            );
        }
        Ok(out)
    }
}
