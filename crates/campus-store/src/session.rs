//! Session key space: a combined user-object slot and a standalone token
//! slot. Both are written on login so that clearing one of them does not
//! lose the session.

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::StoredUser;
use crate::slots::KeySpace;

pub const USER_SLOT: &str = "user";
pub const TOKEN_SLOT: &str = "auth_token";

impl Database {
    /// Load the user object. A slot that does not decode is reported as
    /// [`StoreError::CorruptSlot`] so the caller can decide to purge it.
    pub fn load_user_object(&self) -> Result<Option<StoredUser>> {
        let Some(json) = self.read_slot(KeySpace::Session, USER_SLOT)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StoreError::CorruptSlot {
                space: KeySpace::Session.as_str(),
                key: USER_SLOT.to_string(),
                source,
            })
    }

    pub fn store_user_object(&self, user: &StoredUser) -> Result<()> {
        let json = serde_json::to_string(user)?;
        self.write_slot(KeySpace::Session, USER_SLOT, &json)
    }

    pub fn load_auth_token(&self) -> Result<Option<String>> {
        Ok(self
            .read_slot(KeySpace::Session, TOKEN_SLOT)?
            .filter(|t| !t.trim().is_empty()))
    }

    pub fn store_auth_token(&self, token: &str) -> Result<()> {
        self.write_slot(KeySpace::Session, TOKEN_SLOT, token)
    }

    /// Remove both session slots.
    pub fn clear_session(&self) -> Result<()> {
        self.clear_slot(KeySpace::Session, USER_SLOT)?;
        self.clear_slot(KeySpace::Session, TOKEN_SLOT)?;
        Ok(())
    }
}
