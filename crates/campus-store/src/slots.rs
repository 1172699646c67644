use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

/// Logical partition of the slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpace {
    /// Current user object and bearer token.
    Session,
    /// Mirrors of server data used as fallback sources.
    Cache,
}

impl KeySpace {
    pub fn as_str(self) -> &'static str {
        match self {
            KeySpace::Session => "session",
            KeySpace::Cache => "cache",
        }
    }
}

impl Database {
    pub fn read_slot(&self, space: KeySpace, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM slots WHERE space = ?1 AND key = ?2",
                params![space.as_str(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn write_slot(&self, space: KeySpace, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO slots (space, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(space, key) DO UPDATE SET value = excluded.value,
                                                   updated_at = excluded.updated_at",
            params![space.as_str(), key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Returns whether a slot was actually removed.
    pub fn clear_slot(&self, space: KeySpace, key: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM slots WHERE space = ?1 AND key = ?2",
            params![space.as_str(), key],
        )?;
        Ok(affected > 0)
    }

    pub fn clear_space(&self, space: KeySpace) -> Result<usize> {
        let affected = self
            .conn()
            .execute("DELETE FROM slots WHERE space = ?1", params![space.as_str()])?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trip_and_overwrite() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.read_slot(KeySpace::Session, "k").unwrap(), None);

        db.write_slot(KeySpace::Session, "k", "one").unwrap();
        db.write_slot(KeySpace::Session, "k", "two").unwrap();
        assert_eq!(
            db.read_slot(KeySpace::Session, "k").unwrap().as_deref(),
            Some("two")
        );

        // Same key in another space is independent.
        assert_eq!(db.read_slot(KeySpace::Cache, "k").unwrap(), None);

        assert!(db.clear_slot(KeySpace::Session, "k").unwrap());
        assert!(!db.clear_slot(KeySpace::Session, "k").unwrap());
    }

    #[test]
    fn clear_space_leaves_other_space() {
        let db = Database::open_in_memory().unwrap();
        db.write_slot(KeySpace::Session, "a", "1").unwrap();
        db.write_slot(KeySpace::Session, "b", "2").unwrap();
        db.write_slot(KeySpace::Cache, "a", "3").unwrap();

        assert_eq!(db.clear_space(KeySpace::Session).unwrap(), 2);
        assert_eq!(db.read_slot(KeySpace::Cache, "a").unwrap().as_deref(), Some("3"));
    }
}
