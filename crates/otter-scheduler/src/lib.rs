//! `otter-scheduler`: "remind me" reminders with SQLite persistence.
//!
//! # Overview
//!
//! A reminder is created from free text such as `post memes 1h`: the first
//! duration token is parsed by [`timeexpr`], the due instant is derived from
//! the source message timestamp by [`schedule::compute_due`], and the record
//! is written through a [`store::ReminderStore`]. The [`engine::ReminderPoller`]
//! wakes on a fixed interval, claims every undelivered reminder falling due
//! before the end of the next window, and delivers each claimed reminder once.
//!
//! # Duration units
//!
//! | Token | Unit    | Arithmetic          |
//! |-------|---------|---------------------|
//! | `m`   | minutes | fixed duration      |
//! | `h/H` | hours   | fixed duration      |
//! | `d/D` | days    | calendar days       |
//! | `M`   | months  | calendar months     |

pub mod db;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod service;
pub mod store;
pub mod timeexpr;
pub mod types;

pub use engine::{ReminderPoller, TickReport};
pub use error::{Result, SchedulerError};
pub use service::{ListScope, ReminderRequest, ReminderService};
pub use store::{ReminderStore, SqliteReminderStore};
pub use types::{DurationUnit, Reminder, StoredReminder};
