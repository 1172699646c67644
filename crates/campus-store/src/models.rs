//! Records persisted in the session key space.

use serde::{Deserialize, Serialize};

use campus_shared::types::Role;

/// The user object slot: identity plus the bearer token it was issued with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub token: String,
}
