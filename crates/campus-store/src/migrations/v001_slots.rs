//! v001 -- Key/value slots.
//!
//! One table holds every durable slot, partitioned by key space
//! (`session`, `cache`).

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    space      TEXT NOT NULL,                 -- 'session' | 'cache'
    key        TEXT NOT NULL,
    value      TEXT NOT NULL,                 -- JSON or raw token
    updated_at TEXT NOT NULL,                 -- RFC-3339

    PRIMARY KEY (space, key)
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
