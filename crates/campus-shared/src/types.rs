use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PROVISIONAL_ID_PREFIX;

/// Identifier of a remote record.
///
/// Server identifiers are opaque strings. Client-synthesized records carry a
/// provisional identifier with the reserved `local_` prefix until the server
/// confirms them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh provisional identifier, unique per call.
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role claim carried by the session. Authorization decisions on the client
/// are display-only; the backend enforces them again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Faculty,
    Admin,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Query-string form used by the `sentiment` filter on list endpoints.
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_ids_are_unique_and_prefixed() {
        let a = EntityId::provisional();
        let b = EntityId::provisional();
        assert_ne!(a, b);
        assert!(a.is_provisional());
        assert!(!EntityId::from("p1").is_provisional());
    }

    #[test]
    fn role_accepts_unknown_values() {
        let role: Role = serde_json::from_str("\"moderator\"").unwrap();
        assert_eq!(role, Role::Other);
        let admin: Role = serde_json::from_str("\"admin\"").unwrap();
        assert!(admin.is_admin());
    }

    #[test]
    fn sentiment_label_parse_is_case_insensitive() {
        assert_eq!(SentimentLabel::parse("Positive"), Some(SentimentLabel::Positive));
        assert_eq!(SentimentLabel::parse("mixed"), None);
    }
}
