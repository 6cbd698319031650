use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc};

use crate::error::{Result, SchedulerError};
use crate::types::DurationUnit;

/// Compute the due instant for an offset of `count` `unit`s after `from`.
///
/// Minutes and hours are fixed-length additions. Days and months use
/// calendar arithmetic. A month step keeps the day of month and lets days
/// past the end of the target month roll into the next one
/// (Jan 31 + 1 month = Mar 3, or Mar 2 in a leap year).
pub fn compute_due(from: DateTime<Utc>, count: u32, unit: DurationUnit) -> Result<DateTime<Utc>> {
    let due = match unit {
        DurationUnit::Minutes => from.checked_add_signed(Duration::minutes(i64::from(count))),
        DurationUnit::Hours => from.checked_add_signed(Duration::hours(i64::from(count))),
        DurationUnit::Days => from.checked_add_days(Days::new(u64::from(count))),
        DurationUnit::Months => add_months_rolling(from, count),
    };
    due.ok_or_else(|| SchedulerError::InvalidInterval(format!("{count} {unit} is out of range")))
}

/// Move to the first of the month `count` months on, then add back the
/// original day offset so overflowing days carry forward.
fn add_months_rolling(from: DateTime<Utc>, count: u32) -> Option<DateTime<Utc>> {
    let first = NaiveDate::from_ymd_opt(from.year(), from.month(), 1)?
        .checked_add_months(Months::new(count))?;
    let date = first.checked_add_days(Days::new(u64::from(from.day() - 1)))?;
    Some(date.and_time(from.time()).and_utc())
}
