//! Campus events, the one screen with a local fallback.
//!
//! Under [`FallbackPolicy::LocalMirror`] a non-empty server list is
//! mirrored into the local cache, and a failed or empty fetch shows the
//! cache instead with no error. When the server comes back empty while the
//! cache still holds records the server never confirmed, an admin viewer
//! pushes them back once each, then refetches after a short delay.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use campus_shared::models::{Event, EventDraft};
use campus_shared::types::EntityId;
use campus_shared::validation;

use crate::api::ApiError;
use crate::engine::{Mutation, Settled};
use crate::error::{ClientError, Result};
use crate::state::{AppState, SharedDatabase};

use super::{lock, DataSource, FallbackPolicy, ListCore, ListState};

#[derive(Debug, Clone)]
pub struct EventsScreen {
    core: ListCore<Event>,
    db: SharedDatabase,
    policy: FallbackPolicy,
    resync_delay: Duration,
}

impl EventsScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            core: ListCore::new(app),
            db: app.database.clone(),
            policy: FallbackPolicy::LocalMirror,
            resync_delay: app.config.events_resync_delay,
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn state(&self) -> Result<ListState<Event>> {
        self.core.snapshot()
    }

    /// Events currently held in the local mirror.
    pub fn read_cache(&self) -> Vec<Event> {
        match self.db.lock() {
            Ok(db) => db.read_events_cache(),
            Err(e) => {
                warn!(error = %e, "events cache lock poisoned");
                Vec::new()
            }
        }
    }

    /// Replace the local mirror. `false` when it could not be written.
    pub fn write_cache(&self, events: &[Event]) -> bool {
        match self.db.lock() {
            Ok(db) => db.write_events_cache(events),
            Err(e) => {
                warn!(error = %e, "events cache lock poisoned");
                false
            }
        }
    }

    pub async fn refresh(&self) -> Result<bool> {
        if self.policy == FallbackPolicy::None {
            let token = self.core.token()?;
            let api = self.core.api.clone();
            return self
                .core
                .fetch(async move {
                    let env = api.list_events(&token).await?;
                    Ok::<_, ApiError>(env.data.events)
                })
                .await;
        }

        let pushed = self.fetch_with_fallback().await?;
        if pushed > 0 {
            debug!(pushed, delay_ms = self.resync_delay.as_millis() as u64, "refetching after sync-back");
            tokio::time::sleep(self.resync_delay).await;
            self.fetch_with_fallback().await?;
        }
        Ok(true)
    }

    /// One fetch under the mirror policy. Returns how many cached records
    /// were pushed back to the server.
    async fn fetch_with_fallback(&self) -> Result<usize> {
        let ticket = self.core.start_fetch()?;
        let token = self.core.session.get_token();

        let result = match token {
            Some(ref token) => self.core.api.list_events(token).await.map(|env| env.data.events),
            None => Err(ApiError::Status {
                status: 401,
                message: ClientError::Unauthenticated.to_string(),
            }),
        };

        if !self.core.query.is_current(ticket) {
            debug!("discarding superseded events response");
            return Ok(0);
        }

        match result {
            Ok(events) if !events.is_empty() => {
                self.write_cache(&events);
                self.show(events, DataSource::Server)?;
                Ok(0)
            }
            Ok(_) => {
                let cached = self.read_cache();
                debug!(cached = cached.len(), "server returned no events, using cache");
                self.show(cached.clone(), DataSource::LocalCache)?;

                match token {
                    Some(token) if !cached.is_empty() && self.core.session.is_admin() => {
                        Ok(self.sync_back(&token, &cached).await)
                    }
                    _ => Ok(0),
                }
            }
            Err(e) => {
                warn!(error = %e, "events fetch failed, using cache");
                let cached = self.read_cache();
                self.show(cached, DataSource::LocalCache)?;
                Ok(0)
            }
        }
    }

    fn show(&self, events: Vec<Event>, source: DataSource) -> Result<()> {
        let mut st = self.core.lock()?;
        st.items.replace_all(events);
        st.source = source;
        st.loading = false;
        st.error = None;
        Ok(())
    }

    /// Post every never-confirmed cached record that has not been attempted
    /// before. The attempt is recorded first so overlapping passes cannot
    /// post the same content twice; a failed post clears its record so the
    /// next pass tries again.
    async fn sync_back(&self, token: &str, cached: &[Event]) -> usize {
        let pending: Vec<(String, &Event)> = {
            let db = match lock(&self.db) {
                Ok(db) => db,
                Err(e) => {
                    warn!(error = %e, "skipping sync-back");
                    return 0;
                }
            };
            cached
                .iter()
                .filter(|event| event.id.is_provisional())
                .map(|event| (event.content_hash(), event))
                .filter(|(hash, event)| match db.record_sync_attempt(hash, event.id.as_str()) {
                    Ok(first) => first,
                    Err(e) => {
                        warn!(error = %e, event_id = %event.id, "sync ledger unavailable");
                        false
                    }
                })
                .collect()
        };

        if pending.is_empty() {
            return 0;
        }

        let api = &self.core.api;
        let results = join_all(pending.into_iter().map(|(hash, event)| async move {
            let outcome = api.create_event(token, &event.to_draft()).await;
            (hash, event.id.clone(), outcome)
        }))
        .await;

        let mut pushed = 0;
        for (hash, id, outcome) in results {
            match outcome {
                Ok(_) => {
                    pushed += 1;
                    info!(event_id = %id, "Cached event pushed to server");
                }
                Err(e) => {
                    warn!(error = %e, event_id = %id, "failed to push cached event, will retry");
                    self.forget_attempt(&hash);
                }
            }
        }
        pushed
    }

    fn forget_attempt(&self, hash: &str) {
        let forgotten = lock(&self.db).and_then(|db| db.forget_sync_attempt(hash).map_err(ClientError::from));
        if let Err(e) = forgotten {
            warn!(error = %e, "could not clear sync ledger entry");
        }
    }

    // -- mutations (admin only) ---------------------------------------------

    pub async fn create(&self, draft: EventDraft) -> Result<Settled> {
        self.core.require_admin()?;
        validate(&draft).map_err(|e| self.core.fail(e))?;
        let token = self.core.token()?;

        let provisional = draft.to_event(EntityId::provisional());
        let mutation = self.core.begin(|items| Some(items.begin_create(provisional)))?;
        let result = self.core.api.create_event(&token, &draft).await;
        let settled = self.settle(mutation, result.map(|env| env.data.event))?;

        if settled == Settled::NeedsRefetch {
            self.refresh().await?;
        }
        Ok(settled)
    }

    pub async fn update(&self, id: &EntityId, draft: EventDraft) -> Result<Settled> {
        self.core.require_admin()?;
        validate(&draft).map_err(|e| self.core.fail(e))?;

        // Records the server never saw are edited locally only.
        if self.is_local_only(id) {
            let mutation = self
                .core
                .begin(|items| items.begin_update(id, |event| draft.apply_to(event)))?;
            self.core.keep_local(mutation)?;
            self.mirror_current()?;
            return Ok(Settled::Confirmed);
        }

        let token = self.core.token()?;
        let mutation = self
            .core
            .begin(|items| items.begin_update(id, |event| draft.apply_to(event)))?;
        let result = self.core.api.update_event(&token, id, &draft).await;
        self.settle(mutation, result.map(|env| env.data.event))
    }

    pub async fn delete(&self, id: &EntityId) -> Result<Settled> {
        self.core.require_admin()?;

        if self.is_local_only(id) {
            let mutation = self.core.begin(|items| items.begin_remove(id))?;
            self.core.keep_local(mutation)?;
            self.mirror_current()?;
            info!(event_id = %id, "Local event deleted");
            return Ok(Settled::Confirmed);
        }

        let token = self.core.token()?;
        let mutation = self.core.begin(|items| items.begin_remove(id))?;
        let result = self.core.api.delete_event(&token, id).await;
        let settled = self.settle(mutation, result.map(|_| None))?;
        info!(event_id = %id, "Event deleted");
        Ok(settled)
    }

    fn is_local_only(&self, id: &EntityId) -> bool {
        id.is_provisional() && self.policy == FallbackPolicy::LocalMirror
    }

    /// Settle a mutation. Under the mirror policy an unreachable server
    /// keeps the optimistic change and stores it locally instead of rolling
    /// back; every settle refreshes the mirror.
    fn settle(&self, mutation: Mutation<Event>, result: std::result::Result<Option<Event>, ApiError>) -> Result<Settled> {
        if self.policy == FallbackPolicy::None {
            return self.core.settle(mutation, result);
        }

        let settled = match result {
            Err(ref e) if e.is_unreachable() => {
                info!(error = %e, "server unreachable, event change kept locally");
                self.core.keep_local(mutation)?;
                {
                    let mut st = self.core.lock()?;
                    st.source = DataSource::LocalCache;
                }
                Settled::Confirmed
            }
            other => self.core.settle(mutation, other)?,
        };
        self.mirror_current()?;
        Ok(settled)
    }

    fn mirror_current(&self) -> Result<()> {
        let items = self.core.lock()?.items.items().to_vec();
        if !self.write_cache(&items) {
            warn!("events cache not updated");
        }
        Ok(())
    }
}

fn validate(draft: &EventDraft) -> std::result::Result<(), ClientError> {
    validation::require("Title", &draft.title)?;
    validation::require("Date", &draft.date)?;
    validation::require("Location", &draft.location)?;
    validation::require("Category", &draft.category)?;
    Ok(())
}
