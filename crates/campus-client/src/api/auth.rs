use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use campus_shared::models::UserProfile;

use super::{ApiClient, ApiError, Envelope};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_answer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterData {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityQuestionData {
    #[serde(default)]
    pub security_question: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetTokenData {
    #[serde(default)]
    pub reset_token: String,
}

impl ApiClient {
    /// `POST users/login`. A success without `data.token` is rejected.
    pub async fn login(&self, username: &str, password: &str) -> Result<Envelope<LoginData>, ApiError> {
        let body = json!({ "username": username, "password": password });
        let env: Envelope<LoginData> = self
            .send_json(Method::POST, None, "users/login", &body)
            .await?;
        if env.data.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("login response carries no token".into()));
        }
        Ok(env)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Envelope<RegisterData>, ApiError> {
        self.send_json(Method::POST, None, "users/register", request).await
    }

    pub async fn verify_email(
        &self,
        email: &str,
        verification_code: &str,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        let body = json!({ "email": email, "verification_code": verification_code });
        self.send_json(Method::POST, None, "users/verify", &body).await
    }

    pub async fn forgot_password_initiate(
        &self,
        email: &str,
    ) -> Result<Envelope<SecurityQuestionData>, ApiError> {
        let body = json!({ "email": email });
        self.send_json(Method::POST, None, "users/forgot-password/initiate", &body)
            .await
    }

    pub async fn forgot_password_verify(
        &self,
        email: &str,
        security_answer: &str,
    ) -> Result<Envelope<ResetTokenData>, ApiError> {
        let body = json!({ "email": email, "security_answer": security_answer });
        self.send_json(Method::POST, None, "users/forgot-password/verify", &body)
            .await
    }

    pub async fn forgot_password_reset(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        let body = json!({ "reset_token": reset_token, "new_password": new_password });
        self.send_json(Method::POST, None, "users/forgot-password/reset", &body)
            .await
    }
}
