use tracing::info;

use campus_shared::models::{ApplicationDraft, Opportunity, OpportunityDraft};
use campus_shared::types::EntityId;
use campus_shared::validation;

use crate::api::ApiError;
use crate::engine::{Entity, Settled};
use crate::error::{ClientError, Result};
use crate::state::AppState;

use super::{ListCore, ListState};

/// Opportunities board: internships, jobs, research positions.
#[derive(Debug, Clone)]
pub struct OpportunitiesScreen {
    core: ListCore<Opportunity>,
}

impl OpportunitiesScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            core: ListCore::new(app),
        }
    }

    pub fn state(&self) -> Result<ListState<Opportunity>> {
        self.core.snapshot()
    }

    pub async fn refresh(&self, kind: Option<&str>) -> Result<bool> {
        let token = self.core.token()?;
        let api = self.core.api.clone();
        let kind = kind.map(str::to_string);
        self.core
            .fetch(async move {
                let env = api.list_opportunities(&token, kind.as_deref()).await?;
                Ok::<_, ApiError>(env.data.opportunities)
            })
            .await
    }

    /// The backend answers a create with the new id only, so the confirmed
    /// record is the provisional one under its server id.
    pub async fn create(&self, draft: OpportunityDraft) -> Result<Settled> {
        validate(&draft).map_err(|e| self.core.fail(e))?;
        let token = self.core.token()?;

        let poster = self.core.session.current().map(|s| s.author());
        let provisional = draft.to_provisional(poster);
        let mutation = self.core.begin(|items| Some(items.begin_create(provisional.clone())))?;

        let result = self.core.api.create_opportunity(&token, &draft).await;
        let confirmed = result.map(|env| {
            env.data.opportunity_id.map(|id| {
                let mut confirmed = provisional.clone();
                confirmed.set_id(EntityId::from(id));
                confirmed.is_verified = env.data.is_verified;
                confirmed
            })
        });
        let settled = self.core.settle(mutation, confirmed)?;
        info!(settled = ?settled, "Opportunity created");

        if settled == Settled::NeedsRefetch {
            self.refresh(None).await?;
        }
        Ok(settled)
    }

    pub async fn update(&self, id: &EntityId, draft: OpportunityDraft) -> Result<Settled> {
        validate(&draft).map_err(|e| self.core.fail(e))?;
        let token = self.core.token()?;

        let api = self.core.api.clone();
        let local = draft.clone();
        let target = id.clone();
        self.core
            .mutate(
                |items| items.begin_update(id, |o| local.apply_to(o)),
                async move {
                    api.update_opportunity(&token, &target, &draft).await?;
                    Ok::<_, ApiError>(None)
                },
            )
            .await
    }

    pub async fn delete(&self, id: &EntityId) -> Result<Settled> {
        let token = self.core.token()?;
        let api = self.core.api.clone();
        let target = id.clone();
        self.core
            .mutate(|items| items.begin_remove(id), async move {
                api.delete_opportunity(&token, &target).await?;
                Ok::<_, ApiError>(None)
            })
            .await
    }

    pub async fn apply(&self, id: &EntityId, application: &ApplicationDraft) -> Result<Option<String>> {
        validation::require("Cover letter", &application.cover_letter)
            .and_then(|_| validation::optional_url("Resume URL", application.resume_url.as_deref()))
            .and_then(|_| validation::optional_url("Portfolio URL", application.portfolio_url.as_deref()))
            .map_err(|e| self.core.fail(e.into()))?;
        let token = self.core.token()?;

        let env = self
            .core
            .api
            .apply_to_opportunity(&token, id, application)
            .await
            .map_err(|e| self.core.fail(e.into()))?;
        info!(opportunity_id = %id, "Application submitted");
        Ok(env.data.application_id)
    }

    /// Poster email verification, step one.
    pub async fn send_verification_code(&self, email: &str) -> Result<()> {
        validation::email(email).map_err(|e| self.core.fail(e.into()))?;
        let token = self.core.token()?;
        self.core
            .api
            .send_verification_code(&token, email)
            .await
            .map_err(|e| self.core.fail(e.into()))?;
        Ok(())
    }

    /// Poster email verification, step two.
    pub async fn check_verification_code(&self, email: &str, code: &str) -> Result<()> {
        validation::require("Verification code", code).map_err(|e| self.core.fail(e.into()))?;
        let token = self.core.token()?;
        self.core
            .api
            .check_verification_code(&token, email, code.trim())
            .await
            .map_err(|e| self.core.fail(e.into()))?;
        Ok(())
    }
}

fn validate(draft: &OpportunityDraft) -> std::result::Result<(), ClientError> {
    validation::require("Title", &draft.title)?;
    validation::require("Description", &draft.description)?;
    validation::require("Type", &draft.kind)?;
    validation::require("Domain", &draft.domain)?;
    validation::optional_url("Application form URL", draft.application_form_url.as_deref())?;
    Ok(())
}
