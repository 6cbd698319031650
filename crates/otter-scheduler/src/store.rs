use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use otter_core::config::EXTERNAL_CALL_TIMEOUT_SECS;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::db::init_db;
use crate::error::{Result, SchedulerError};
use crate::types::{Reminder, StoredReminder};

/// Persistence boundary for reminders.
///
/// Every call is independent: implementations must not hold a connection
/// across calls.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Persist a new reminder, returning its row id.
    async fn insert(&self, reminder: &Reminder) -> Result<i64>;

    /// Undelivered reminders with `due < cutoff`, oldest first.
    async fn due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StoredReminder>>;

    /// Mark a reminder delivered. Returns `true` only for the caller that
    /// flipped it from undelivered, so a reminder is claimed at most once.
    async fn claim(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;

    /// Undelivered reminders on `server` due after `after`, optionally
    /// restricted to one creator, soonest first.
    async fn upcoming(
        &self,
        server: u64,
        creator: Option<u64>,
        after: DateTime<Utc>,
    ) -> Result<Vec<StoredReminder>>;
}

/// SQLite-backed store that opens a fresh connection for each operation.
#[derive(Debug, Clone)]
pub struct SqliteReminderStore {
    path: PathBuf,
    timeout: Duration,
}

impl SqliteReminderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: Duration::from_secs(EXTERNAL_CALL_TIMEOUT_SECS),
        }
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the database file and schema up front so startup fails fast on
    /// an unusable path.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.run(|_conn| Ok(())).await
    }

    /// Run `op` against a connection scoped to this call, off the async
    /// runtime and under the store deadline.
    ///
    /// A blocking task cannot be cancelled. When the deadline fires the caller
    /// gets `Timeout` at once, while the task runs on detached and drops its
    /// connection when `op` returns. Lock waits inside it are bounded by the
    /// same deadline through `busy_timeout`.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let busy = self.timeout;
        let task = tokio::task::spawn_blocking(move || {
            let conn = open(&path, busy)?;
            op(&conn)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(SchedulerError::Task(join.to_string())),
            Err(_) => Err(SchedulerError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

fn open(path: &Path, busy: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SchedulerError::Task(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy)?;
    init_db(&conn)?;
    Ok(conn)
}

const SELECT_COLUMNS: &str = "SELECT id, due, message, server, creator, channel,
        source_message, source_timestamp, delivered_at
 FROM reminders";

fn millis_to_utc(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(idx, ms)
    })
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredReminder> {
    let delivered_at = row
        .get::<_, Option<i64>>(8)?
        .map(|ms| millis_to_utc(8, ms))
        .transpose()?;
    Ok(StoredReminder {
        id: row.get(0)?,
        reminder: Reminder {
            due: millis_to_utc(1, row.get(1)?)?,
            message: row.get(2)?,
            server: row.get(3)?,
            creator: row.get(4)?,
            channel: row.get(5)?,
            source_message: row.get(6)?,
            source_timestamp: millis_to_utc(7, row.get(7)?)?,
        },
        delivered_at,
    })
}

#[async_trait]
impl ReminderStore for SqliteReminderStore {
    async fn insert(&self, reminder: &Reminder) -> Result<i64> {
        let r = reminder.clone();
        let id = self
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO reminders
                     (due, message, server, creator, channel, source_message,
                      source_timestamp, delivered_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
                    params![
                        r.due.timestamp_millis(),
                        r.message,
                        r.server,
                        r.creator,
                        r.channel,
                        r.source_message,
                        r.source_timestamp.timestamp_millis(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        debug!(reminder_id = id, due = %reminder.due, "reminder stored");
        Ok(id)
    }

    async fn due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StoredReminder>> {
        let cutoff_ms = cutoff.timestamp_millis();
        self.run(move |conn| {
            let sql = format!(
                "{SELECT_COLUMNS} WHERE delivered_at IS NULL AND due < ?1 ORDER BY due, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([cutoff_ms], row_to_stored)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn claim(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let at_ms = at.timestamp_millis();
        self.run(move |conn| {
            let n = conn.execute(
                "UPDATE reminders SET delivered_at = ?1
                 WHERE id = ?2 AND delivered_at IS NULL",
                params![at_ms, id],
            )?;
            Ok(n == 1)
        })
        .await
    }

    async fn upcoming(
        &self,
        server: u64,
        creator: Option<u64>,
        after: DateTime<Utc>,
    ) -> Result<Vec<StoredReminder>> {
        let after_ms = after.timestamp_millis();
        self.run(move |conn| {
            let sql = format!(
                "{SELECT_COLUMNS}
                 WHERE delivered_at IS NULL AND server = ?1 AND due > ?2
                   AND (?3 IS NULL OR creator = ?3)
                 ORDER BY due, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![server, after_ms, creator], row_to_stored)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }
}

impl SqliteReminderStore {
    /// Fetch a single reminder by id regardless of delivery state.
    pub async fn get(&self, id: i64) -> Result<Option<StoredReminder>> {
        self.run(move |conn| {
            let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
            let found = conn
                .query_row(&sql, [id], row_to_stored)
                .optional()?;
            Ok(found)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn store() -> (tempfile::TempDir, SqliteReminderStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteReminderStore::new(dir.path().join("nested").join("reminders.db"));
        (dir, store)
    }

    fn reminder(due: DateTime<Utc>, server: u64, creator: u64, message: &str) -> Reminder {
        Reminder {
            due,
            message: message.to_string(),
            server,
            creator,
            channel: 42,
            source_message: 7,
            source_timestamp: due - ChronoDuration::hours(1),
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 2, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_preserves_fields() {
        let (_dir, store) = store();
        let r = reminder(base(), 1, 100, "post memes");
        let id = store.insert(&r).await.unwrap();

        let got = store.get(id).await.unwrap().unwrap();
        assert_eq!(got.id, id);
        assert_eq!(got.reminder, r);
        assert!(got.delivered_at.is_none());
    }

    #[tokio::test]
    async fn due_before_excludes_later_and_delivered() {
        let (_dir, store) = store();
        let early = store.insert(&reminder(base(), 1, 100, "early")).await.unwrap();
        let claimed = store
            .insert(&reminder(base() + ChronoDuration::minutes(1), 1, 100, "claimed"))
            .await
            .unwrap();
        store
            .insert(&reminder(base() + ChronoDuration::hours(2), 1, 100, "later"))
            .await
            .unwrap();

        assert!(store.claim(claimed, base()).await.unwrap());

        let due = store.due_before(base() + ChronoDuration::minutes(5)).await.unwrap();
        let ids: Vec<i64> = due.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![early]);
    }

    #[tokio::test]
    async fn due_before_is_strict() {
        let (_dir, store) = store();
        store.insert(&reminder(base(), 1, 100, "edge")).await.unwrap();
        assert!(store.due_before(base()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn claim_succeeds_exactly_once() {
        let (_dir, store) = store();
        let id = store.insert(&reminder(base(), 1, 100, "once")).await.unwrap();

        assert!(store.claim(id, base()).await.unwrap());
        assert!(!store.claim(id, base()).await.unwrap());

        let got = store.get(id).await.unwrap().unwrap();
        assert_eq!(got.delivered_at, Some(base()));
    }

    #[tokio::test]
    async fn claim_unknown_id_is_false() {
        let (_dir, store) = store();
        assert!(!store.claim(9999, base()).await.unwrap());
    }

    #[tokio::test]
    async fn upcoming_scopes_by_server_and_creator() {
        let (_dir, store) = store();
        let now = base();
        store
            .insert(&reminder(now + ChronoDuration::hours(3), 1, 100, "mine later"))
            .await
            .unwrap();
        store
            .insert(&reminder(now + ChronoDuration::hours(1), 1, 100, "mine soon"))
            .await
            .unwrap();
        store
            .insert(&reminder(now + ChronoDuration::hours(2), 1, 200, "theirs"))
            .await
            .unwrap();
        store
            .insert(&reminder(now + ChronoDuration::hours(2), 2, 100, "other server"))
            .await
            .unwrap();
        store
            .insert(&reminder(now - ChronoDuration::hours(1), 1, 100, "past"))
            .await
            .unwrap();

        let mine = store.upcoming(1, Some(100), now).await.unwrap();
        let bodies: Vec<&str> = mine.iter().map(|s| s.reminder.message.as_str()).collect();
        assert_eq!(bodies, vec!["mine soon", "mine later"]);

        let all = store.upcoming(1, None, now).await.unwrap();
        let bodies: Vec<&str> = all.iter().map(|s| s.reminder.message.as_str()).collect();
        assert_eq!(bodies, vec!["mine soon", "theirs", "mine later"]);
    }

    #[tokio::test]
    async fn slow_call_times_out_and_store_stays_usable() {
        let (_dir, store) = store();
        let store = store.with_timeout(std::time::Duration::from_millis(50));
        store.ensure_schema().await.unwrap();

        let err = store
            .run(|_conn| {
                std::thread::sleep(std::time::Duration::from_millis(300));
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Timeout { ms: 50 }));
        assert!(err.is_retryable());

        let id = store.insert(&reminder(base(), 1, 2, "still here")).await.unwrap();
        assert!(store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let (dir, store) = store();
        let id = store.insert(&reminder(base(), 1, 100, "persist")).await.unwrap();
        drop(store);

        let reopened = SqliteReminderStore::new(dir.path().join("nested").join("reminders.db"));
        assert!(reopened.get(id).await.unwrap().is_some());
    }
}
