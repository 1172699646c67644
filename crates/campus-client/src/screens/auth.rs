//! Sign-in, registration and password recovery.

use tracing::{info, warn};

use campus_shared::models::UserProfile;
use campus_shared::validation;

use crate::api::{ApiClient, RegisterRequest};
use crate::error::Result;
use crate::session::{Session, SessionHandle};
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    /// Derived from the email's local part when left empty.
    pub username: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub year: Option<String>,
    pub department: Option<String>,
    pub college: Option<String>,
    pub security_question: Option<String>,
    pub security_answer: Option<String>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<()> {
        validation::require("Name", &self.name)?;
        validation::email(&self.email)?;
        validation::new_password(&self.password, &self.confirm_password)?;
        Ok(())
    }

    fn to_request(&self) -> RegisterRequest {
        let email = self.email.trim().to_string();
        let username = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        RegisterRequest {
            username,
            email,
            password: self.password.clone(),
            name: self.name.trim().to_string(),
            year: non_blank(&self.year),
            department: non_blank(&self.department),
            college: non_blank(&self.college),
            security_question: non_blank(&self.security_question),
            security_answer: non_blank(&self.security_answer),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthScreen {
    api: ApiClient,
    session: SessionHandle,
}

impl AuthScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            api: app.api.clone(),
            session: app.session.clone(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        validation::require("Username", username)?;
        validation::require("Password", password)?;

        let env = self.api.login(username.trim(), password).await?;
        let user = env.data.user.unwrap_or_else(|| UserProfile {
            username: username.trim().to_string(),
            ..Default::default()
        });
        let session = Session::from_login(&user, env.data.token);
        self.session.login(session.clone())?;
        Ok(session)
    }

    /// Register, and sign in straight away when the backend hands back a
    /// token. Returns the session in that case.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Option<Session>> {
        form.validate()?;
        let request = form.to_request();
        let env = self.api.register(&request).await?;
        info!(username = %request.username, "Account registered");

        let Some(token) = env.data.token.filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };
        let user = UserProfile {
            id: env.data.user_id.unwrap_or_default(),
            username: request.username,
            name: request.name,
            email: Some(request.email),
            college: request.college,
            ..Default::default()
        };
        let session = Session::from_login(&user, token);
        self.session.login(session.clone())?;
        Ok(Some(session))
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<()> {
        validation::email(email)?;
        validation::require("Verification code", code)?;
        self.api.verify_email(email.trim(), code.trim()).await?;
        Ok(())
    }

    /// First recovery step. Returns the account's security question.
    pub async fn forgot_password_initiate(&self, email: &str) -> Result<String> {
        validation::email(email)?;
        let env = self.api.forgot_password_initiate(email.trim()).await?;
        Ok(env.data.security_question)
    }

    /// Second recovery step. Returns the reset token.
    pub async fn forgot_password_verify(&self, email: &str, answer: &str) -> Result<String> {
        validation::email(email)?;
        validation::require("Security answer", answer)?;
        let env = self.api.forgot_password_verify(email.trim(), answer).await?;
        Ok(env.data.reset_token)
    }

    pub async fn forgot_password_reset(&self, reset_token: &str, password: &str, confirmation: &str) -> Result<()> {
        validation::require("Reset token", reset_token)?;
        validation::new_password(password, confirmation)?;
        self.api.forgot_password_reset(reset_token, password).await?;
        info!("Password reset");
        Ok(())
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// Summaries are available signed out too; the token is sent when present.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        validation::require("Text", text)?;
        let token = self.session.get_token();
        let env = self.api.summarize_text(token.as_deref(), text).await?;
        if env.data.summary.is_empty() {
            warn!("summary response was empty");
        }
        Ok(env.data.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Asha Rao".into(),
            email: "asha.rao@college.edu".into(),
            password: "longenough1".into(),
            confirm_password: "longenough1".into(),
            department: Some("  ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn username_defaults_to_email_local_part() {
        let request = form().to_request();
        assert_eq!(request.username, "asha.rao");
        assert_eq!(request.department, None);
    }

    #[test]
    fn explicit_username_wins() {
        let mut f = form();
        f.username = Some("asha".into());
        assert_eq!(f.to_request().username, "asha");
    }

    #[test]
    fn validation_runs_before_any_request() {
        let mut f = form();
        f.confirm_password = "different1".into();
        assert!(matches!(f.validate(), Err(ClientError::Validation(_))));

        let mut f = form();
        f.email = "not-an-email".into();
        assert!(matches!(f.validate(), Err(ClientError::Validation(_))));
    }
}
