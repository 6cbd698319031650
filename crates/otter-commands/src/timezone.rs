use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{CommandError, Result};

pub const NO_USER: &str = "no user specified";
pub const USER_NOT_FOUND: &str = "User not found";

/// Configured member -> IANA zone lookup for the `time` command.
#[derive(Debug, Clone, Default)]
pub struct MemberClock {
    zones: HashMap<String, String>,
}

impl MemberClock {
    /// Keys are matched lower-cased.
    pub fn new(zones: HashMap<String, String>) -> Self {
        Self {
            zones: zones
                .into_iter()
                .map(|(name, zone)| (name.to_lowercase(), zone))
                .collect(),
        }
    }

    /// Local time of `who` at `now`, e.g. `dave : 20:00, 2 January 2021, (Australia/Perth)`.
    pub fn local_time(&self, now: DateTime<Utc>, who: &str) -> Result<String> {
        let who = who.trim().to_lowercase();
        if who.is_empty() {
            return Ok(NO_USER.to_string());
        }
        let zone_name = self
            .zones
            .get(&who)
            .ok_or_else(|| CommandError::usage(USER_NOT_FOUND))?;
        let zone: Tz = zone_name
            .parse()
            .map_err(|_| CommandError::usage(format!("Unknown timezone {zone_name} for {who}")))?;

        let local = now.with_timezone(&zone);
        Ok(format!(
            "{who} : {}, ({zone_name})",
            local.format("%H:%M, %-d %B %Y")
        ))
    }
}
