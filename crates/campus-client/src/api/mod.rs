//! Typed wrappers over the REST backend.
//!
//! Every call returns the decoded `data` member of the backend envelope
//! `{ status, message, data }` or an [`ApiError`]. Calls are single-shot:
//! no retry, no backoff. Endpoint groups live in submodules as further
//! `impl ApiClient` blocks.

mod auth;
mod campus;
mod opportunities;
mod resources;
mod social;
mod summarize;
mod users;

pub use auth::{LoginData, RegisterData, RegisterRequest, ResetTokenData, SecurityQuestionData};
pub use campus::{EventData, EventList, NewsData, NewsList};
pub use opportunities::{ApplicationData, OpportunityCreated, OpportunityList};
pub use resources::{DownloadData, ResourceList, ResourceQuery, ResourceUpload, ResourceUploaded, UpvoteData};
pub use social::{CommentData, CommentList, LikeData, PostData, PostMedia, PostPage, PostQuery};
pub use summarize::SummaryData;
pub use users::{ImageKind, ImageUploaded, ProfileUpdate};

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use campus_shared::constants::GENERIC_ERROR_MESSAGE;

use crate::config::ClientConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connect refused, DNS failure, timeout or a truncated body.
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// Non-2xx response. `message` is the server's, or a generic one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose envelope says `status: "error"`.
    #[error("{message}")]
    Rejected { message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}

/// A decoded success envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub status: String,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    fn into_part(self) -> Result<Part, ApiError> {
        let part = Part::bytes(self.bytes.to_vec()).file_name(self.file_name);
        match self.content_type {
            Some(ct) => part
                .mime_str(&ct)
                .map_err(|e| ApiError::InvalidRequest(format!("bad content type {ct}: {e}"))),
            None => Ok(part),
        }
    }
}

/// Text fields plus named files, sent as `multipart/form-data`.
#[derive(Debug, Default)]
pub(crate) struct MultipartBody {
    fields: Vec<(&'static str, String)>,
    files: Vec<(&'static str, FilePart)>,
}

impl MultipartBody {
    pub(crate) fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub(crate) fn opt_text(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.text(name, v),
            _ => self,
        }
    }

    pub(crate) fn file(mut self, name: &'static str, file: FilePart) -> Self {
        self.files.push((name, file));
        self
    }

    pub(crate) fn opt_file(self, name: &'static str, file: Option<FilePart>) -> Self {
        match file {
            Some(f) => self.file(name, f),
            None => self,
        }
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for (name, file) in self.files {
            form = form.part(name, file.into_part()?);
        }
        Ok(form)
    }
}

/// HTTP client for the campus backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get<T>(
        &self,
        token: Option<&str>,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let query: Vec<_> = query.iter().filter(|(_, v)| !v.is_empty()).collect();
        let req = self.request(Method::GET, path, token).query(&query);
        self.send(req).await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        token: Option<&str>,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let req = self.request(method, path, token).json(body);
        self.send(req).await
    }

    pub(crate) async fn send_multipart<T>(
        &self,
        method: Method,
        token: Option<&str>,
        path: &str,
        body: MultipartBody,
    ) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let req = self.request(method, path, token).multipart(body.into_form()?);
        self.send(req).await
    }

    pub(crate) async fn delete<T>(&self, token: Option<&str>, path: &str) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let req = self.request(Method::DELETE, path, token);
        self.send(req).await
    }

    async fn send<T>(&self, req: RequestBuilder) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let response = req.send().await.map_err(|e| {
            tracing::debug!(error = %e, "request failed before a response");
            ApiError::Unreachable(e.to_string())
        })?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        let decoded = decode_response(status.as_u16(), &body);
        if let Err(ref e) = decoded {
            tracing::debug!(status = status.as_u16(), path = %url, error = %e, "request failed");
        }
        decoded
    }
}

/// Turn a status code and raw body into an envelope or a normalised error.
pub(crate) fn decode_response<T>(status: u16, body: &[u8]) -> Result<Envelope<T>, ApiError>
where
    T: DeserializeOwned + Default,
{
    let trimmed = body.iter().all(u8::is_ascii_whitespace);
    let raw: Option<RawEnvelope> = if trimmed {
        Some(RawEnvelope::default())
    } else {
        serde_json::from_slice(body).ok()
    };

    if !(200..300).contains(&status) {
        let message = raw
            .and_then(|r| r.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        return Err(ApiError::Status { status, message });
    }

    let raw = raw.ok_or_else(|| ApiError::InvalidResponse("body is not a JSON envelope".into()))?;

    if raw.status.as_deref() == Some("error") {
        let message = raw
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        return Err(ApiError::Rejected { message });
    }

    let data = match raw.data {
        None | Some(serde_json::Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?,
    };

    Ok(Envelope {
        status: raw.status.unwrap_or_else(|| "success".to_string()),
        message: raw.message.unwrap_or_default(),
        data,
    })
}
