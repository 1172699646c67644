//! Wire models mirrored from the REST backend.
//!
//! Every record is remote-authoritative: the client holds copies, never the
//! source of truth. Fields the backend may omit carry `#[serde(default)]` so
//! a partial payload decodes to an emptier record instead of failing.
//! Counters are signed so that an optimistic increment followed by its
//! rollback is always an exact inverse.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::KDF_CONTEXT_EVENT_HASH;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

/// Embedded author reference on posts, comments, resources and opportunities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedEmotion {
    pub name: String,
    pub percentage: f64,
}

/// A social-feed post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub attachment_urls: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub emotional_intensity: Option<f64>,
    #[serde(default)]
    pub detected_emotions: Vec<DetectedEmotion>,
}

impl Post {
    /// Flip the viewer's like. Count and flag always move together, and
    /// applying the toggle twice restores the original record.
    pub fn toggle_like(&mut self) {
        if self.is_liked {
            self.like_count -= 1;
        } else {
            self.like_count += 1;
        }
        self.is_liked = !self.is_liked;
    }

    pub fn increment_comments(&mut self) {
        self.comment_count += 1;
    }

    pub fn decrement_comments(&mut self) {
        self.comment_count -= 1;
    }

    pub fn has_sentiment(&self) -> bool {
        self.sentiment.is_some()
    }
}

/// User-authored input for a new post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl PostDraft {
    /// Build the provisional record shown until the server confirms the post.
    pub fn to_provisional(&self, author: Author) -> Post {
        Post {
            id: EntityId::provisional(),
            title: self.title.clone(),
            content: self.content.clone(),
            author,
            category: self.category.clone(),
            tags: self.tags.clone(),
            is_anonymous: self.is_anonymous,
            media_urls: Vec::new(),
            attachment_urls: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
            updated_at: None,
            comment_count: 0,
            like_count: 0,
            is_liked: false,
            sentiment: None,
            sentiment_score: None,
            emotional_intensity: None,
            detected_emotions: Vec::new(),
        }
    }
}

/// Partial update of a post's text fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PostEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PostEdit {
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(ref title) = self.title {
            post.title = title.clone();
        }
        if let Some(ref content) = self.content {
            post.content = content.clone();
        }
        if let Some(ref category) = self.category {
            post.category = Some(category.clone());
        }
        if let Some(ref tags) = self.tags {
            post.tags = tags.clone();
        }
        post.updated_at = Some(Utc::now().to_rfc3339());
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment, always scoped to exactly one post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub post_id: EntityId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Comment {
    /// Flip the viewer's like. The count never drops below zero, so this is
    /// not self-inverse on a stale record; callers keep the prior copy.
    pub fn toggle_like(&mut self) {
        if self.is_liked {
            self.like_count = (self.like_count - 1).max(0);
        } else {
            self.like_count += 1;
        }
        self.is_liked = !self.is_liked;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CommentDraft {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CommentDraft {
    pub fn to_provisional(&self, post_id: &EntityId, author: Author) -> Comment {
        Comment {
            id: EntityId::provisional(),
            post_id: post_id.clone(),
            content: self.content.clone(),
            author,
            created_at: Utc::now().to_rfc3339(),
            updated_at: None,
            is_anonymous: self.is_anonymous,
            like_count: 0,
            is_liked: false,
            media_url: None,
            link: self.link.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A campus event. Events are the one entity kind also mirrored into the
/// local cache, so they must round-trip through JSON losslessly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Admin-authored input for an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    /// Calendar date, `YYYY-MM-DD` or a full RFC 3339 timestamp.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub location: String,
    #[serde(default)]
    pub organizer: String,
    pub category: String,
}

impl EventDraft {
    /// Day of month and short month name derived from `date`, if parseable.
    pub fn calendar_fields(&self) -> Option<(u32, String)> {
        let date = parse_calendar_date(&self.date)?;
        Some((date.day(), date.format("%b").to_string()))
    }

    /// Record sent to the server and stored in the cache: the draft plus the
    /// derived calendar fields and an `upcoming` status.
    pub fn to_event(&self, id: EntityId) -> Event {
        let (day, month) = match self.calendar_fields() {
            Some((d, m)) => (Some(d), Some(m)),
            None => (None, None),
        };
        Event {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
            organizer: self.organizer.clone(),
            category: self.category.clone(),
            day,
            month,
            status: Some("upcoming".to_string()),
        }
    }

    /// Overwrite the authored fields of `event`, keeping its id and status.
    pub fn apply_to(&self, event: &mut Event) {
        let status = event.status.take();
        let mut updated = self.to_event(event.id.clone());
        if status.is_some() {
            updated.status = status;
        }
        *event = updated;
    }
}

impl Event {
    /// The user-authored part of the record, as sent when re-creating it.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
            organizer: self.organizer.clone(),
            category: self.category.clone(),
        }
    }

    /// Stable hash over the user-visible content, ignoring the identifier.
    /// Two cache records describing the same event hash equal even when
    /// they were assigned different provisional ids.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_EVENT_HASH);
        for field in [
            self.title.as_str(),
            self.description.as_str(),
            self.date.as_str(),
            self.time.as_deref().unwrap_or_default(),
            self.location.as_str(),
            self.category.as_str(),
        ] {
            hasher.update(field.trim().as_bytes());
            hasher.update(&[0x1f]);
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub readers: i64,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub category: String,
}

impl NewsDraft {
    pub fn to_provisional(&self, author: Option<String>) -> NewsItem {
        NewsItem {
            id: EntityId::provisional(),
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            date: Utc::now().to_rfc3339(),
            author,
            readers: 0,
            updated_at: None,
            sentiment: None,
            sentiment_score: None,
        }
    }

    pub fn apply_to(&self, item: &mut NewsItem) {
        item.title = self.title.clone();
        item.content = self.content.clone();
        item.category = self.category.clone();
        item.updated_at = Some(Utc::now().to_rfc3339());
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A shared study resource (notes, papers, slides).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub semester: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub download_count: i64,
    #[serde(default)]
    pub uploader: Option<Author>,
    /// `"none"`, `"upvote"` or `"downvote"`.
    #[serde(default = "default_vote")]
    pub user_vote: String,
    #[serde(default)]
    pub created_at: String,
}

fn default_vote() -> String {
    "none".to_string()
}

impl Resource {
    pub fn is_upvoted(&self) -> bool {
        self.user_vote == "upvote"
    }

    /// Flip the viewer's upvote; self-inverse like `Post::toggle_like`.
    pub fn toggle_upvote(&mut self) {
        if self.is_upvoted() {
            self.upvotes -= 1;
            self.user_vote = default_vote();
        } else {
            self.upvotes += 1;
            self.user_vote = "upvote".to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Opportunity {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `internship`, `job`, `research`, `freelance`, ...
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub compensation: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub application_instructions: Option<String>,
    #[serde(default)]
    pub application_form_url: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub poster: Option<Author>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OpportunityDraft {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub domain: String,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_form_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl OpportunityDraft {
    pub fn to_provisional(&self, poster: Option<Author>) -> Opportunity {
        let mut opportunity = Opportunity {
            id: EntityId::provisional(),
            title: String::new(),
            description: String::new(),
            kind: String::new(),
            domain: String::new(),
            is_paid: false,
            compensation: None,
            company: None,
            location: None,
            remote: false,
            skills_required: Vec::new(),
            requirements: Vec::new(),
            responsibilities: Vec::new(),
            application_instructions: None,
            application_form_url: None,
            deadline: None,
            poster,
            is_verified: false,
            created_at: Utc::now().to_rfc3339(),
        };
        self.apply_to(&mut opportunity);
        opportunity
    }

    pub fn apply_to(&self, o: &mut Opportunity) {
        o.title = self.title.clone();
        o.description = self.description.clone();
        o.kind = self.kind.clone();
        o.domain = self.domain.clone();
        o.is_paid = self.is_paid;
        o.compensation = self.compensation.clone();
        o.company = self.company.clone();
        o.location = self.location.clone();
        o.remote = self.remote;
        o.skills_required = self.skills_required.clone();
        o.requirements = self.requirements.clone();
        o.responsibilities = self.responsibilities.clone();
        o.application_instructions = self.application_instructions.clone();
        o.application_form_url = self.application_form_url.clone();
        o.deadline = self.deadline.clone();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ApplicationDraft {
    pub cover_letter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// User record as returned by login and the profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<crate::types::Role>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}
