//! The signed-in user's profile. Every successful call feeds the session.

use tracing::info;

use campus_shared::models::UserProfile;
use campus_shared::validation;

use crate::api::{ApiClient, FilePart, ImageKind, ProfileUpdate};
use crate::error::{ClientError, Result};
use crate::session::{ProfilePatch, Session, SessionHandle};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct ProfileScreen {
    api: ApiClient,
    session: SessionHandle,
}

impl ProfileScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            api: app.api.clone(),
            session: app.session.clone(),
        }
    }

    /// A placeholder session has no user id, so the own-profile paths are used.
    fn user_id(&self) -> Option<String> {
        self.session
            .current()
            .filter(|s| !s.is_placeholder() && !s.user_id.is_empty())
            .map(|s| s.user_id)
    }

    pub async fn load(&self) -> Result<UserProfile> {
        let token = self.session.require_token()?;
        let env = self.api.get_profile(&token, None).await?;
        self.session.update_profile(&ProfilePatch::from_profile(&env.data))?;
        Ok(env.data)
    }

    /// Another user's public profile. The session is left alone.
    pub async fn view(&self, user_id: &str) -> Result<UserProfile> {
        let token = self.session.require_token()?;
        let env = self.api.get_profile(&token, Some(user_id)).await?;
        Ok(env.data)
    }

    pub async fn save(&self, update: &ProfileUpdate) -> Result<Option<Session>> {
        if let Some(ref name) = update.name {
            validation::require("Name", name)?;
        }
        if let Some(ref email) = update.email {
            validation::email(email)?;
        }
        let token = self.session.require_token()?;
        let user_id = self.user_id();
        let env = self
            .api
            .update_profile(&token, user_id.as_deref(), update)
            .await?;

        // Older backends answer with an empty body; fall back to what was sent.
        let patch = if env.data.id.is_empty() && env.data.name.is_empty() {
            ProfilePatch {
                display_name: update.name.clone(),
                handle: update.username.clone(),
                email: update.email.clone(),
                college: update.college.clone(),
                ..Default::default()
            }
        } else {
            ProfilePatch::from_profile(&env.data)
        };
        self.session.update_profile(&patch)
    }

    /// Upload a profile or background image and return its URL.
    pub async fn upload_image(&self, kind: ImageKind, file: FilePart) -> Result<String> {
        let token = self.session.require_token()?;
        let user_id = self.user_id();
        let env = self
            .api
            .upload_profile_image(&token, user_id.as_deref(), kind, file)
            .await?;
        let url = env
            .data
            .url(kind)
            .map(str::to_string)
            .ok_or_else(|| ClientError::NotFound("Image URL".into()))?;

        let patch = match kind {
            ImageKind::Profile => ProfilePatch {
                avatar_url: Some(url.clone()),
                ..Default::default()
            },
            ImageKind::Background => ProfilePatch {
                background_url: Some(url.clone()),
                ..Default::default()
            },
        };
        self.session.update_profile(&patch)?;
        Ok(url)
    }

    /// Delete the account, then sign out.
    pub async fn delete_account(&self) -> Result<()> {
        let token = self.session.require_token()?;
        self.api.delete_account(&token).await?;
        info!("Account deleted");
        self.session.logout();
        Ok(())
    }
}
