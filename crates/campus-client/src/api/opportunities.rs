use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use campus_shared::models::{ApplicationDraft, Opportunity, OpportunityDraft};
use campus_shared::types::EntityId;

use super::{ApiClient, ApiError, Envelope};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityList {
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
}

/// Creation returns only the new identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityCreated {
    #[serde(default)]
    pub opportunity_id: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationData {
    #[serde(default)]
    pub application_id: Option<String>,
}

impl ApiClient {
    pub async fn list_opportunities(
        &self,
        token: &str,
        kind: Option<&str>,
    ) -> Result<Envelope<OpportunityList>, ApiError> {
        let query = [("type", kind.unwrap_or_default().to_string())];
        self.get(Some(token), "opportunities", &query).await
    }

    pub async fn send_verification_code(
        &self,
        token: &str,
        email: &str,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        let body = json!({ "email": email });
        self.send_json(Method::POST, Some(token), "opportunities/verify/send-code", &body)
            .await
    }

    pub async fn check_verification_code(
        &self,
        token: &str,
        email: &str,
        verification_code: &str,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        let body = json!({ "email": email, "verification_code": verification_code });
        self.send_json(Method::POST, Some(token), "opportunities/verify/check-code", &body)
            .await
    }

    pub async fn create_opportunity(
        &self,
        token: &str,
        draft: &OpportunityDraft,
    ) -> Result<Envelope<OpportunityCreated>, ApiError> {
        self.send_json(Method::POST, Some(token), "opportunities", draft).await
    }

    pub async fn update_opportunity(
        &self,
        token: &str,
        id: &EntityId,
        draft: &OpportunityDraft,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.send_json(Method::PUT, Some(token), &format!("opportunities/{id}"), draft)
            .await
    }

    pub async fn delete_opportunity(
        &self,
        token: &str,
        id: &EntityId,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), &format!("opportunities/{id}")).await
    }

    pub async fn apply_to_opportunity(
        &self,
        token: &str,
        id: &EntityId,
        application: &ApplicationDraft,
    ) -> Result<Envelope<ApplicationData>, ApiError> {
        self.send_json(Method::POST, Some(token), &format!("opportunities/{id}/apply"), application)
            .await
    }
}
