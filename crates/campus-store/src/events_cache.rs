//! Events mirror and sync-back ledger.
//!
//! The mirror is fail-soft: an absent or undecodable slot reads as an empty
//! list and a failed write is reported as `false`, never as an error. This
//! is the opposite of token handling, which fails closed.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use campus_shared::models::Event;

use crate::database::Database;
use crate::error::Result;
use crate::slots::KeySpace;

pub const EVENTS_SLOT: &str = "campus_events";

impl Database {
    pub fn read_events_cache(&self) -> Vec<Event> {
        let json = match self.read_slot(KeySpace::Cache, EVENTS_SLOT) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "events cache unreadable");
                return Vec::new();
            }
        };
        match serde_json::from_str(&json) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "events cache corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn write_events_cache(&self, events: &[Event]) -> bool {
        let json = match serde_json::to_string(events) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode events cache");
                return false;
            }
        };
        match self.write_slot(KeySpace::Cache, EVENTS_SLOT, &json) {
            Ok(()) => {
                tracing::debug!(count = events.len(), "events cache written");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write events cache");
                false
            }
        }
    }

    pub fn was_sync_attempted(&self, content_hash: &str) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM sync_attempts WHERE content_hash = ?1",
                params![content_hash],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Remember that a record with this content has been pushed. Returns
    /// `false` if the hash was already present.
    pub fn record_sync_attempt(&self, content_hash: &str, record_id: &str) -> Result<bool> {
        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO sync_attempts (content_hash, record_id, attempted_at)
             VALUES (?1, ?2, ?3)",
            params![content_hash, record_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Drop the record for a push that did not go through. Returns whether
    /// one existed.
    pub fn forget_sync_attempt(&self, content_hash: &str) -> Result<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM sync_attempts WHERE content_hash = ?1",
            params![content_hash],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_shared::models::EventDraft;
    use campus_shared::types::EntityId;

    fn event(id: &str, title: &str) -> Event {
        EventDraft {
            title: title.into(),
            description: "d".into(),
            date: "2025-05-28".into(),
            location: "Hall".into(),
            category: "Workshop".into(),
            ..Default::default()
        }
        .to_event(EntityId::from(id))
    }

    #[test]
    fn empty_when_absent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.read_events_cache().is_empty());
    }

    #[test]
    fn write_then_read_preserves_order() {
        let db = Database::open_in_memory().unwrap();
        let events = vec![event("e1", "One"), event("local_x", "Two")];
        assert!(db.write_events_cache(&events));
        assert_eq!(db.read_events_cache(), events);
    }

    #[test]
    fn corrupt_cache_reads_as_empty() {
        let db = Database::open_in_memory().unwrap();
        db.write_slot(KeySpace::Cache, EVENTS_SLOT, "[{\"broken\"").unwrap();
        assert!(db.read_events_cache().is_empty());
    }

    #[test]
    fn cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus.db");
        {
            let db = Database::open_at(&path).unwrap();
            assert!(db.write_events_cache(&[event("e1", "One")]));
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.read_events_cache().len(), 1);
    }

    #[test]
    fn sync_ledger_deduplicates() {
        let db = Database::open_in_memory().unwrap();
        let hash = event("local_a", "One").content_hash();

        assert!(!db.was_sync_attempted(&hash).unwrap());
        assert!(db.record_sync_attempt(&hash, "local_a").unwrap());
        assert!(!db.record_sync_attempt(&hash, "local_b").unwrap());
        assert!(db.was_sync_attempted(&hash).unwrap());
    }

    #[test]
    fn forgotten_attempt_can_be_recorded_again() {
        let db = Database::open_in_memory().unwrap();
        let hash = event("local_a", "One").content_hash();

        assert!(db.record_sync_attempt(&hash, "local_a").unwrap());
        assert!(db.forget_sync_attempt(&hash).unwrap());
        assert!(!db.was_sync_attempted(&hash).unwrap());
        assert!(!db.forget_sync_attempt(&hash).unwrap());
        assert!(db.record_sync_attempt(&hash, "local_a").unwrap());
    }
}
