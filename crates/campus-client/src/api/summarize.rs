use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{ApiClient, ApiError, Envelope};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryData {
    #[serde(default)]
    pub summary: String,
}

impl ApiClient {
    pub async fn summarize_text(&self, token: Option<&str>, text: &str) -> Result<Envelope<SummaryData>, ApiError> {
        let body = json!({ "text": text });
        self.send_json(Method::POST, token, "summarize/text", &body).await
    }
}
