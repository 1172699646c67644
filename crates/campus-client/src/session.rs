//! Session store.
//!
//! One [`SessionHandle`] owns the current identity and every persistence
//! side effect that goes with it. Handles are cheap to clone and are passed
//! explicitly to whatever needs a token. Subscribers receive a fresh
//! [`SessionSnapshot`] on every transition.
//!
//! Token handling fails closed: a token that does not decode, has no `exp`
//! claim, or is past its expiry is never handed out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use campus_shared::constants::{PLACEHOLDER_DISPLAY_NAME, PLACEHOLDER_HANDLE, PLACEHOLDER_USER_ID};
use campus_shared::models::{Author, UserProfile};
use campus_shared::token;
use campus_shared::types::Role;
use campus_store::StoredUser;

use crate::error::{ClientError, Result};
use crate::state::SharedDatabase;

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub handle: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub background_url: Option<String>,
    pub college: Option<String>,
    pub role: Role,
    pub bearer_token: String,
}

impl Session {
    /// Build a session from a login response. The role comes from the user
    /// record, then from the token's `role` claim.
    pub fn from_login(user: &UserProfile, bearer_token: String) -> Self {
        let claims = token::decode_claims(&bearer_token).ok();
        let role = user
            .role
            .or_else(|| claims.as_ref().and_then(|c| c.role))
            .unwrap_or_default();
        let user_id = if user.id.is_empty() {
            claims.and_then(|c| c.user_id).unwrap_or_default()
        } else {
            user.id.clone()
        };
        Self {
            user_id,
            display_name: user.name.clone(),
            handle: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.profile_picture.clone(),
            background_url: user.background_image.clone(),
            college: user.college.clone(),
            role,
            bearer_token,
        }
    }

    /// Minimal identity for a valid token found without a user object.
    pub fn placeholder(bearer_token: String) -> Self {
        let role = token::decode_claims(&bearer_token)
            .ok()
            .and_then(|c| c.role)
            .unwrap_or_default();
        Self {
            user_id: PLACEHOLDER_USER_ID.to_string(),
            display_name: PLACEHOLDER_DISPLAY_NAME.to_string(),
            handle: PLACEHOLDER_HANDLE.to_string(),
            email: None,
            avatar_url: None,
            background_url: None,
            college: None,
            role,
            bearer_token,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_placeholder(&self) -> bool {
        self.user_id == PLACEHOLDER_USER_ID
    }

    /// Author reference stamped on provisional records.
    pub fn author(&self) -> Author {
        Author {
            id: self.user_id.clone(),
            username: self.handle.clone(),
            name: self.display_name.clone(),
            profile_picture: self.avatar_url.clone(),
        }
    }

    fn from_stored(stored: StoredUser) -> Self {
        Self {
            user_id: stored.id,
            display_name: stored.name,
            handle: stored.username,
            email: stored.email,
            avatar_url: stored.profile_picture,
            background_url: stored.background_image,
            college: stored.college,
            role: stored.role,
            bearer_token: stored.token,
        }
    }

    fn to_stored(&self) -> StoredUser {
        StoredUser {
            id: self.user_id.clone(),
            name: self.display_name.clone(),
            username: self.handle.clone(),
            email: self.email.clone(),
            profile_picture: self.avatar_url.clone(),
            background_image: self.background_url.clone(),
            college: self.college.clone(),
            role: self.role,
            token: self.bearer_token.clone(),
        }
    }
}

/// Profile fields that can change while signed in. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub background_url: Option<String>,
    pub college: Option<String>,
}

impl ProfilePatch {
    pub fn from_profile(profile: &UserProfile) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            display_name: non_empty(&profile.name),
            handle: non_empty(&profile.username),
            email: profile.email.clone(),
            avatar_url: profile.profile_picture.clone(),
            background_url: profile.background_image.clone(),
            college: profile.college.clone(),
        }
    }

    fn apply_to(&self, session: &mut Session) {
        if let Some(ref v) = self.display_name {
            session.display_name = v.clone();
        }
        if let Some(ref v) = self.handle {
            session.handle = v.clone();
        }
        if let Some(ref v) = self.email {
            session.email = Some(v.clone());
        }
        if let Some(ref v) = self.avatar_url {
            session.avatar_url = Some(v.clone());
        }
        if let Some(ref v) = self.background_url {
            session.background_url = Some(v.clone());
        }
        if let Some(ref v) = self.college {
            session.college = Some(v.clone());
        }
    }
}

/// What subscribers observe. `is_admin` is re-derived on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub is_admin: bool,
}

impl SessionSnapshot {
    fn of(session: Option<Session>) -> Self {
        let is_admin = session.as_ref().is_some_and(Session::is_admin);
        Self { session, is_admin }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Decode the token's payload and compare its expiry with the clock.
/// Anything undecodable counts as expired.
pub fn is_expired(bearer_token: &str) -> bool {
    token::is_expired(bearer_token)
}

struct SessionStore {
    db: SharedDatabase,
    tx: watch::Sender<SessionSnapshot>,
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionStore>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("snapshot", &*self.inner.tx.borrow())
            .finish()
    }
}

impl SessionHandle {
    /// A signed-out handle. Nothing is read from storage.
    pub fn new(db: SharedDatabase) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(SessionStore { db, tx }),
        }
    }

    /// Application start: rebuild the session from storage.
    ///
    /// An expired stored token is purged from every slot before anything
    /// else sees it. A valid token without a user object yields a
    /// placeholder identity, which is written back to the user slot.
    pub fn restore(db: SharedDatabase) -> Self {
        let handle = Self::new(db);
        let session = handle.restore_from_storage(Utc::now());
        if let Some(ref s) = session {
            info!(user_id = %s.user_id, placeholder = s.is_placeholder(), "Session restored");
        }
        handle.publish(session);
        handle
    }

    fn restore_from_storage(&self, now: DateTime<Utc>) -> Option<Session> {
        let db = match self.inner.db.lock() {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "session storage lock poisoned");
                return None;
            }
        };

        let stored_user = match db.load_user_object() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "stored user object unreadable, discarding");
                if let Err(e) = db.clear_slot(campus_store::KeySpace::Session, campus_store::session::USER_SLOT) {
                    warn!(error = %e, "failed to clear user object");
                }
                None
            }
        };

        if let Some(user) = stored_user {
            if !user.token.is_empty() && !token::is_expired_at(&user.token, now) {
                let session = Session::from_stored(user);
                if let Err(e) = db.store_auth_token(&session.bearer_token) {
                    warn!(error = %e, "failed to mirror token slot");
                }
                return Some(session);
            }
            debug!("stored token expired or missing, clearing session slots");
            if let Err(e) = db.clear_session() {
                warn!(error = %e, "failed to purge expired session");
            }
            return None;
        }

        let stored_token = match db.load_auth_token() {
            Ok(t) => t?,
            Err(e) => {
                warn!(error = %e, "token slot unreadable");
                return None;
            }
        };

        if token::is_expired_at(&stored_token, now) {
            debug!("standalone token expired, purging");
            if let Err(e) = db.clear_session() {
                warn!(error = %e, "failed to purge expired token");
            }
            return None;
        }

        let session = Session::placeholder(stored_token);
        if let Err(e) = db.store_user_object(&session.to_stored()) {
            warn!(error = %e, "failed to persist placeholder user");
        }
        Some(session)
    }

    pub fn current(&self) -> Option<Session> {
        self.snapshot().session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(Utc::now())
    }

    /// The published snapshot, dropping the session first if its token
    /// has expired by `now`.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let snapshot = self.inner.tx.borrow().clone();
        let expired = snapshot
            .session
            .as_ref()
            .is_some_and(|s| token::is_expired_at(&s.bearer_token, now));
        if !expired {
            return snapshot;
        }
        if let Some(ref session) = snapshot.session {
            info!(user_id = %session.user_id, "Session token expired");
        }
        self.publish(None);
        SessionSnapshot::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.snapshot().is_admin
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.tx.subscribe()
    }

    /// First unexpired token from: the in-memory session, the standalone
    /// token slot, the user-object slot. An expired in-memory session is
    /// dropped on the way.
    pub fn get_token(&self) -> Option<String> {
        self.get_token_at(Utc::now())
    }

    pub fn get_token_at(&self, now: DateTime<Utc>) -> Option<String> {
        if let Some(session) = self.snapshot_at(now).session {
            return Some(session.bearer_token);
        }

        let db = match self.inner.db.lock() {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "session storage lock poisoned");
                return None;
            }
        };

        let slot_token = db.load_auth_token().ok().flatten();
        if let Some(t) = slot_token.filter(|t| !token::is_expired_at(t, now)) {
            return Some(t);
        }

        let user_token = db
            .load_user_object()
            .ok()
            .flatten()
            .map(|u| u.token)
            .filter(|t| !t.is_empty());
        if let Some(t) = user_token.filter(|t| !token::is_expired_at(t, now)) {
            return Some(t);
        }

        None
    }

    /// Token for an authenticated call, or [`ClientError::Unauthenticated`].
    pub fn require_token(&self) -> Result<String> {
        self.get_token().ok_or(ClientError::Unauthenticated)
    }

    /// Install a new session and persist it to both slots. A session whose
    /// token is already expired is refused and nothing is written.
    pub fn login(&self, session: Session) -> Result<()> {
        if token::is_expired(&session.bearer_token) {
            warn!(user_id = %session.user_id, "refusing login with expired token");
            return Err(ClientError::Unauthenticated);
        }
        {
            let db = self.inner.db.lock().map_err(ClientError::poisoned)?;
            db.store_user_object(&session.to_stored())?;
            db.store_auth_token(&session.bearer_token)?;
        }
        info!(user_id = %session.user_id, admin = session.is_admin(), "User logged in");
        self.publish(Some(session));
        Ok(())
    }

    /// Clear the session and both slots. No network call is made; storage
    /// failures are logged and the in-memory session is cleared regardless.
    pub fn logout(&self) {
        match self.inner.db.lock() {
            Ok(db) => {
                if let Err(e) = db.clear_session() {
                    warn!(error = %e, "failed to clear session slots");
                }
            }
            Err(e) => warn!(error = %e, "session storage lock poisoned"),
        }
        info!("User logged out");
        self.publish(None);
    }

    /// Merge profile fields into the session and re-persist the user object.
    /// Returns the updated session, or `None` when signed out.
    pub fn update_profile(&self, patch: &ProfilePatch) -> Result<Option<Session>> {
        let Some(mut session) = self.current() else {
            return Ok(None);
        };
        patch.apply_to(&mut session);
        {
            let db = self.inner.db.lock().map_err(ClientError::poisoned)?;
            db.store_user_object(&session.to_stored())?;
        }
        debug!(user_id = %session.user_id, "Profile updated");
        self.publish(Some(session.clone()));
        Ok(Some(session))
    }

    fn publish(&self, session: Option<Session>) {
        self.inner.tx.send_replace(SessionSnapshot::of(session));
    }
}
