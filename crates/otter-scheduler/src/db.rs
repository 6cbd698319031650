use rusqlite::Connection;

use crate::error::Result;

/// Initialise the reminder schema in `conn`.
///
/// Timestamps are stored as unix milliseconds. `delivered_at` stays NULL
/// until the poller claims the row.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reminders (
            id                INTEGER NOT NULL PRIMARY KEY,
            due               INTEGER NOT NULL,   -- unix ms
            message           TEXT    NOT NULL,
            server            INTEGER NOT NULL,   -- 0 for direct messages
            creator           INTEGER NOT NULL,
            channel           INTEGER NOT NULL,
            source_message    INTEGER NOT NULL,
            source_timestamp  INTEGER NOT NULL,   -- unix ms
            delivered_at      INTEGER             -- unix ms or NULL
        ) STRICT;

        -- Polling: SELECT … WHERE delivered_at IS NULL AND due < ?
        CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders (due);
        ",
    )?;
    Ok(())
}
