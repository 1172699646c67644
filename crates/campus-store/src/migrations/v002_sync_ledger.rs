//! v002 -- Sync-back ledger.
//!
//! Records the content hash of every cached event already pushed to the
//! server so a later pass never posts it twice.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sync_attempts (
    content_hash TEXT PRIMARY KEY NOT NULL,   -- hex BLAKE3 over event content
    record_id    TEXT NOT NULL,               -- provisional id at attempt time
    attempted_at TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
