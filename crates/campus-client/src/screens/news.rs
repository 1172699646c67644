use tracing::info;

use campus_shared::models::{NewsDraft, NewsItem};
use campus_shared::sentiment;
use campus_shared::types::{EntityId, SentimentLabel};
use campus_shared::validation;

use crate::api::ApiError;
use crate::engine::Settled;
use crate::error::{ClientError, Result};
use crate::state::AppState;

use super::{ListCore, ListState};

/// Campus news list. Anyone signed in can read; admins add, edit, delete.
#[derive(Debug, Clone)]
pub struct NewsScreen {
    core: ListCore<NewsItem>,
}

impl NewsScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            core: ListCore::new(app),
        }
    }

    pub fn state(&self) -> Result<ListState<NewsItem>> {
        self.core.snapshot()
    }

    pub async fn refresh(&self, sentiment: Option<SentimentLabel>) -> Result<bool> {
        let token = self.core.token()?;
        let api = self.core.api.clone();
        self.core
            .fetch(async move {
                let env = api.list_news(&token, sentiment).await?;
                Ok::<_, ApiError>(env.data.news.into_iter().map(with_sentiment).collect())
            })
            .await
    }

    pub async fn create(&self, draft: NewsDraft) -> Result<Settled> {
        self.core.require_admin()?;
        validate(&draft).map_err(|e| self.core.fail(e))?;
        let token = self.core.token()?;

        let author = self.core.session.current().map(|s| s.display_name);
        let provisional = with_sentiment(draft.to_provisional(author));
        let api = self.core.api.clone();

        let settled = self
            .core
            .mutate(
                move |items| Some(items.begin_create(provisional)),
                async move {
                    let env = api.create_news(&token, &draft).await?;
                    Ok::<_, ApiError>(env.data.news.map(with_sentiment))
                },
            )
            .await?;
        info!("News item created");
        self.refetch_if_needed(settled).await
    }

    pub async fn update(&self, id: &EntityId, draft: NewsDraft) -> Result<Settled> {
        self.core.require_admin()?;
        validate(&draft).map_err(|e| self.core.fail(e))?;
        let token = self.core.token()?;

        let api = self.core.api.clone();
        let local = draft.clone();
        let target = id.clone();
        self.core
            .mutate(
                |items| items.begin_update(id, |item| local.apply_to(item)),
                async move {
                    let env = api.update_news(&token, &target, &draft).await?;
                    Ok::<_, ApiError>(env.data.news.map(with_sentiment))
                },
            )
            .await
    }

    pub async fn delete(&self, id: &EntityId) -> Result<Settled> {
        self.core.require_admin()?;
        let token = self.core.token()?;

        let api = self.core.api.clone();
        let target = id.clone();
        let settled = self
            .core
            .mutate(|items| items.begin_remove(id), async move {
                api.delete_news(&token, &target).await?;
                Ok::<_, ApiError>(None)
            })
            .await?;
        info!(news_id = %id, "News item deleted");
        Ok(settled)
    }

    async fn refetch_if_needed(&self, settled: Settled) -> Result<Settled> {
        if settled == Settled::NeedsRefetch {
            self.refresh(None).await?;
        }
        Ok(settled)
    }
}

fn validate(draft: &NewsDraft) -> std::result::Result<(), ClientError> {
    validation::require("Title", &draft.title)?;
    validation::require("Content", &draft.content)?;
    validation::require("Category", &draft.category)?;
    Ok(())
}

/// Fill in a local estimate when the backend sent no sentiment.
fn with_sentiment(mut item: NewsItem) -> NewsItem {
    if item.sentiment.is_none() {
        let estimate = sentiment::estimate(&format!("{} {}", item.title, item.content));
        item.sentiment = Some(estimate.sentiment.as_query().to_string());
        item.sentiment_score = Some(f64::from(estimate.score) / 100.0);
    }
    item
}
