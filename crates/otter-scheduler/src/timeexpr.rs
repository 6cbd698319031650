//! Relative duration tokens such as `5m`, `2h`, `3d` or `1M` inside free text.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SchedulerError};
use crate::types::DurationUnit;

/// Result of locating a duration token in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDuration {
    pub count: u32,
    pub unit: DurationUnit,
    /// Input text with the first matched token removed, otherwise untouched.
    pub residual: String,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<count>[0-9]+)(?P<unit>m|[hH]|[dD]|M)").expect("duration pattern is valid")
    })
}

/// Find the first `<integer><unit>` token in `text`.
///
/// Fails with [`SchedulerError::NoInterval`] when no token is present. Counts
/// are accepted as written (including zero); a literal too large for `u32`
/// is reported as [`SchedulerError::InvalidInterval`].
pub fn parse_duration(text: &str) -> Result<ParsedDuration> {
    let caps = pattern().captures(text).ok_or(SchedulerError::NoInterval)?;
    let whole = caps.get(0).ok_or(SchedulerError::NoInterval)?;
    let count_str = &caps["count"];
    let unit_str = &caps["unit"];

    let count: u32 = count_str
        .parse()
        .map_err(|_| SchedulerError::InvalidInterval(format!("{count_str}{unit_str}")))?;
    let unit = unit_str
        .chars()
        .next()
        .and_then(DurationUnit::from_token)
        .ok_or(SchedulerError::NoInterval)?;

    let mut residual = String::with_capacity(text.len());
    residual.push_str(&text[..whole.start()]);
    residual.push_str(&text[whole.end()..]);

    Ok(ParsedDuration {
        count,
        unit,
        residual,
    })
}
