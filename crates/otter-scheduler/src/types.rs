use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a relative duration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
    Months,
}

impl DurationUnit {
    /// Map a unit character. Minutes (`m`) and months (`M`) are case
    /// sensitive; hours and days accept either case.
    pub fn from_token(c: char) -> Option<Self> {
        match c {
            'm' => Some(DurationUnit::Minutes),
            'h' | 'H' => Some(DurationUnit::Hours),
            'd' | 'D' => Some(DurationUnit::Days),
            'M' => Some(DurationUnit::Months),
            _ => None,
        }
    }
}

impl std::fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
            DurationUnit::Days => "days",
            DurationUnit::Months => "months",
        };
        write!(f, "{s}")
    }
}

/// A reminder as created from a "remind me" message.
///
/// Immutable once stored: there is no edit or cancel path. `due` is always
/// derived from `source_timestamp` plus the parsed offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub due: DateTime<Utc>,
    /// Reminder body with the duration token stripped.
    pub message: String,
    /// Guild the reminder was created in (`0` for direct messages).
    pub server: u64,
    pub creator: u64,
    pub channel: u64,
    pub source_message: u64,
    pub source_timestamp: DateTime<Utc>,
}

/// A persisted reminder together with its store bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReminder {
    /// Row id assigned by the store.
    pub id: i64,
    pub reminder: Reminder,
    /// Set when the poller claims the reminder for delivery.
    pub delivered_at: Option<DateTime<Utc>>,
}
