//! The client's single SQLite file: session slots, the events mirror and
//! the sync ledger all live here. Every constructor brings the schema up
//! to date before handing the connection out.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

const DB_FILE: &str = "campus.db";

#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// `campus.db` under the per-user data directory from `directories`.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("edu", "campus", "campus").ok_or(StoreError::NoDataDir)?;
        let db_path = dirs.data_dir().join(DB_FILE);
        tracing::info!(path = %db_path.display(), "opening database");
        Self::open_at(&db_path)
    }

    /// Missing parent directories are created.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::migrated(conn)
    }

    /// Nothing survives the drop.
    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// `None` for an in-memory database.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE);

        let db = Database::open_at(&path).unwrap();
        assert!(db.path().is_some());
        drop(db);

        let db = Database::open_at(&path).unwrap();
        let version: u32 = db
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::migrations::CURRENT_VERSION);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join(DB_FILE);
        Database::open_at(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn in_memory_has_no_path() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.path(), None);
    }
}
