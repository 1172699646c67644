use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use campus_shared::models::Resource;
use campus_shared::types::EntityId;

use super::{ApiClient, ApiError, Envelope, FilePart, MultipartBody};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpvoteData {
    #[serde(default)]
    pub upvotes: Option<i64>,
    #[serde(default)]
    pub is_upvoted: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadData {
    #[serde(default)]
    pub download_count: Option<i64>,
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceUploaded {
    #[serde(default)]
    pub resource_id: Option<String>,
}

/// Library filters. Empty values are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub subject: String,
    pub semester: String,
    pub kind: String,
    pub search: String,
    pub tags: String,
}

impl ResourceQuery {
    fn params(&self) -> [(&'static str, String); 5] {
        [
            ("subject", self.subject.clone()),
            ("semester", self.semester.clone()),
            ("type", self.kind.clone()),
            ("search", self.search.clone()),
            ("tags", self.tags.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUpload {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub semester: String,
    pub kind: String,
    pub tags: Vec<String>,
    pub file: FilePart,
}

impl ApiClient {
    pub async fn list_resources(
        &self,
        token: &str,
        query: &ResourceQuery,
    ) -> Result<Envelope<ResourceList>, ApiError> {
        self.get(Some(token), "resources", &query.params()).await
    }

    /// Toggles the viewer's upvote server-side.
    pub async fn like_resource(&self, token: &str, id: &EntityId) -> Result<Envelope<UpvoteData>, ApiError> {
        self.send_json(Method::POST, Some(token), &format!("resources/{id}/like"), &json!({}))
            .await
    }

    pub async fn download_resource(&self, token: &str, id: &EntityId) -> Result<Envelope<DownloadData>, ApiError> {
        self.get(Some(token), &format!("resources/{id}/download"), &[]).await
    }

    pub async fn upload_resource(
        &self,
        token: &str,
        upload: ResourceUpload,
    ) -> Result<Envelope<ResourceUploaded>, ApiError> {
        let body = MultipartBody::default()
            .text("title", upload.title)
            .text("description", upload.description)
            .text("subject", upload.subject)
            .text("semester", upload.semester)
            .text("type", upload.kind)
            .text("tags", upload.tags.join(","))
            .file("file", upload.file);
        self.send_multipart(Method::POST, Some(token), "resources/upload", body)
            .await
    }

    pub async fn delete_resource(&self, token: &str, id: &EntityId) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), &format!("resources/{id}")).await
    }
}
