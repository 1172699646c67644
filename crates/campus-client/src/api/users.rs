use reqwest::Method;
use serde::{Deserialize, Serialize};

use campus_shared::models::UserProfile;

use super::{ApiClient, ApiError, Envelope, FilePart, MultipartBody};

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Profile,
    Background,
}

impl ImageKind {
    fn field(self) -> &'static str {
        match self {
            ImageKind::Profile => "profile_image",
            ImageKind::Background => "background_image",
        }
    }

    fn path(self, user_id: Option<&str>) -> String {
        match (self, user_id) {
            (ImageKind::Profile, Some(id)) => format!("users/{id}/profile-image"),
            (ImageKind::Background, Some(id)) => format!("users/{id}/background-image"),
            (ImageKind::Profile, None) => "users/profile/image".to_string(),
            (ImageKind::Background, None) => "users/profile/background-image".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUploaded {
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}

impl ImageUploaded {
    pub fn url(&self, kind: ImageKind) -> Option<&str> {
        match kind {
            ImageKind::Profile => self.profile_picture.as_deref(),
            ImageKind::Background => self.background_image.as_deref(),
        }
    }
}

fn profile_path(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) => format!("users/{id}"),
        None => "users/profile".to_string(),
    }
}

impl ApiClient {
    /// Own profile when `user_id` is `None`.
    pub async fn get_profile(
        &self,
        token: &str,
        user_id: Option<&str>,
    ) -> Result<Envelope<UserProfile>, ApiError> {
        self.get(Some(token), &profile_path(user_id), &[]).await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        user_id: Option<&str>,
        update: &ProfileUpdate,
    ) -> Result<Envelope<UserProfile>, ApiError> {
        self.send_json(Method::PUT, Some(token), &profile_path(user_id), update)
            .await
    }

    pub async fn upload_profile_image(
        &self,
        token: &str,
        user_id: Option<&str>,
        kind: ImageKind,
        file: FilePart,
    ) -> Result<Envelope<ImageUploaded>, ApiError> {
        let body = MultipartBody::default().file(kind.field(), file);
        self.send_multipart(Method::POST, Some(token), &kind.path(user_id), body)
            .await
    }

    pub async fn delete_account(&self, token: &str) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), "users/account").await
    }
}
