use tracing::info;

use campus_shared::models::Resource;
use campus_shared::types::EntityId;
use campus_shared::validation;

use crate::api::{ApiError, DownloadData, ResourceQuery, ResourceUpload};
use crate::engine::{Patch, Settled};
use crate::error::Result;
use crate::state::AppState;

use super::{ListCore, ListState};

/// Shared study-resource library.
#[derive(Debug, Clone)]
pub struct ResourcesScreen {
    core: ListCore<Resource>,
}

impl ResourcesScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            core: ListCore::new(app),
        }
    }

    pub fn state(&self) -> Result<ListState<Resource>> {
        self.core.snapshot()
    }

    pub async fn refresh(&self, query: &ResourceQuery) -> Result<bool> {
        let token = self.core.token()?;
        let api = self.core.api.clone();
        let query = query.clone();
        self.core
            .fetch(async move {
                let env = api.list_resources(&token, &query).await?;
                Ok::<_, ApiError>(env.data.resources)
            })
            .await
    }

    /// Flip the viewer's upvote. The server's counter, when returned, wins
    /// over the optimistic one.
    pub async fn toggle_upvote(&self, id: &EntityId) -> Result<Settled> {
        let token = self.core.token()?;
        let api = self.core.api.clone();
        let target = id.clone();

        let mutation = self
            .core
            .begin(|items| items.begin_patch(id, Patch::toggle(Resource::toggle_upvote)))?;
        let result = api.like_resource(&token, &target).await;

        let server = match result {
            Ok(env) => {
                let mut current = self.core.item(id)?;
                if let Some(ref mut r) = current {
                    if let Some(upvotes) = env.data.upvotes {
                        r.upvotes = upvotes;
                    }
                    if let Some(upvoted) = env.data.is_upvoted {
                        r.user_vote = if upvoted { "upvote" } else { "none" }.to_string();
                    }
                }
                Ok(current)
            }
            Err(e) => Err(e),
        };
        self.core.settle(mutation, server)
    }

    /// Record a download and return where to fetch the file from.
    pub async fn download(&self, id: &EntityId) -> Result<DownloadData> {
        let token = self.core.token()?;
        let env = self
            .core
            .api
            .download_resource(&token, id)
            .await
            .map_err(|e| self.core.fail(e.into()))?;

        let mut st = self.core.lock()?;
        let count = env.data.download_count;
        st.items.modify(id, |r| match count {
            Some(c) => r.download_count = c,
            None => r.download_count += 1,
        });
        Ok(env.data)
    }

    /// Upload is not optimistic: the record only exists once the file does.
    pub async fn upload(&self, upload: ResourceUpload) -> Result<Option<String>> {
        validation::require("Title", &upload.title).map_err(|e| self.core.fail(e.into()))?;
        validation::require("Subject", &upload.subject).map_err(|e| self.core.fail(e.into()))?;
        let token = self.core.token()?;

        let env = self
            .core
            .api
            .upload_resource(&token, upload)
            .await
            .map_err(|e| self.core.fail(e.into()))?;
        info!(resource_id = ?env.data.resource_id, "Resource uploaded");

        self.refresh(&ResourceQuery::default()).await?;
        Ok(env.data.resource_id)
    }

    pub async fn delete(&self, id: &EntityId) -> Result<Settled> {
        let token = self.core.token()?;
        let api = self.core.api.clone();
        let target = id.clone();
        self.core
            .mutate(|items| items.begin_remove(id), async move {
                api.delete_resource(&token, &target).await?;
                Ok::<_, ApiError>(None)
            })
            .await
    }
}
