//! Campus news and events.

use reqwest::Method;
use serde::Deserialize;

use campus_shared::models::{Event, EventDraft, NewsDraft, NewsItem};
use campus_shared::types::{EntityId, SentimentLabel};

use super::{ApiClient, ApiError, Envelope};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsList {
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsData {
    #[serde(default)]
    pub news: Option<NewsItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub event: Option<Event>,
}

impl ApiClient {
    pub async fn list_news(
        &self,
        token: &str,
        sentiment: Option<SentimentLabel>,
    ) -> Result<Envelope<NewsList>, ApiError> {
        let query = [(
            "sentiment",
            sentiment.map(|s| s.as_query().to_string()).unwrap_or_default(),
        )];
        self.get(Some(token), "campus/news", &query).await
    }

    pub async fn create_news(&self, token: &str, draft: &NewsDraft) -> Result<Envelope<NewsData>, ApiError> {
        self.send_json(Method::POST, Some(token), "campus/news", draft).await
    }

    pub async fn update_news(
        &self,
        token: &str,
        id: &EntityId,
        draft: &NewsDraft,
    ) -> Result<Envelope<NewsData>, ApiError> {
        self.send_json(Method::PUT, Some(token), &format!("campus/news/{id}"), draft)
            .await
    }

    pub async fn delete_news(&self, token: &str, id: &EntityId) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), &format!("campus/news/{id}")).await
    }

    pub async fn list_events(&self, token: &str) -> Result<Envelope<EventList>, ApiError> {
        self.get(Some(token), "campus/events", &[]).await
    }

    /// The outgoing record carries the derived `day`, `month` and `status`
    /// fields alongside the draft.
    pub async fn create_event(&self, token: &str, draft: &EventDraft) -> Result<Envelope<EventData>, ApiError> {
        let body = outgoing_event(draft);
        self.send_json(Method::POST, Some(token), "campus/events", &body).await
    }

    pub async fn update_event(
        &self,
        token: &str,
        id: &EntityId,
        draft: &EventDraft,
    ) -> Result<Envelope<EventData>, ApiError> {
        let body = outgoing_event(draft);
        self.send_json(Method::PUT, Some(token), &format!("campus/events/{id}"), &body)
            .await
    }

    pub async fn delete_event(&self, token: &str, id: &EntityId) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), &format!("campus/events/{id}")).await
    }
}

fn outgoing_event(draft: &EventDraft) -> serde_json::Value {
    let mut value = serde_json::to_value(draft.to_event(EntityId::default()))
        .unwrap_or_else(|_| serde_json::Value::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("id");
    }
    value
}
