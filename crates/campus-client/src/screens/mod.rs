//! Per-screen list state.
//!
//! Every screen owns its own collection, loading flag and error message
//! behind an `Arc<Mutex<_>>`. A lock is taken for a synchronous splice or
//! settle and released before any request goes out.

mod auth;
mod events;
mod feed;
mod news;
mod opportunities;
mod profile;
mod resources;

pub use auth::{AuthScreen, RegistrationForm};
pub use events::EventsScreen;
pub use feed::{FeedFilters, FeedScreen, FeedState};
pub use news::NewsScreen;
pub use opportunities::OpportunitiesScreen;
pub use profile::ProfileScreen;
pub use resources::ResourcesScreen;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use campus_shared::types::EntityId;

use crate::api::{ApiClient, ApiError};
use crate::engine::{Entity, Mutation, MutationState, OptimisticList, Settled};
use crate::error::{ClientError, Result};
use crate::query::{QueryTracker, Ticket};
use crate::session::SessionHandle;
use crate::state::AppState;

/// Whether a screen may substitute locally stored records for the server's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    #[default]
    None,
    /// Mirror successful fetches locally and fall back to the mirror when
    /// the server fails or returns nothing.
    LocalMirror,
}

/// Where the records currently on screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Server,
    LocalCache,
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    pub items: OptimisticList<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub source: DataSource,
    pub last_mutation: MutationState,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: OptimisticList::default(),
            loading: false,
            error: None,
            source: DataSource::default(),
            last_mutation: MutationState::default(),
        }
    }
}

pub(crate) fn lock<S>(state: &Mutex<S>) -> Result<MutexGuard<'_, S>> {
    state.lock().map_err(ClientError::poisoned)
}

/// Fetch and mutation plumbing shared by the simple list screens.
#[derive(Debug, Clone)]
pub(crate) struct ListCore<T> {
    pub(crate) api: ApiClient,
    pub(crate) session: SessionHandle,
    pub(crate) state: Arc<Mutex<ListState<T>>>,
    pub(crate) query: QueryTracker,
}

impl<T: Entity> ListCore<T> {
    pub(crate) fn new(app: &AppState) -> Self {
        Self {
            api: app.api.clone(),
            session: app.session.clone(),
            state: Arc::new(Mutex::new(ListState::default())),
            query: QueryTracker::new(),
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, ListState<T>>> {
        lock(&self.state)
    }

    pub(crate) fn snapshot(&self) -> Result<ListState<T>> {
        Ok(self.lock()?.clone())
    }

    /// Store the error for display and hand it back to the caller.
    pub(crate) fn fail(&self, error: ClientError) -> ClientError {
        if let Ok(mut st) = self.state.lock() {
            st.error = Some(error.to_string());
            st.loading = false;
        }
        error
    }

    pub(crate) fn token(&self) -> Result<String> {
        self.session.require_token().map_err(|e| self.fail(e))
    }

    pub(crate) fn require_admin(&self) -> Result<()> {
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(self.fail(ClientError::Forbidden))
        }
    }

    pub(crate) fn start_fetch(&self) -> Result<Ticket> {
        let ticket = self.query.issue();
        let mut st = self.lock()?;
        st.loading = true;
        Ok(ticket)
    }

    /// Apply a fetch result unless a newer query superseded it. Returns
    /// whether the result was applied.
    pub(crate) fn finish_fetch(&self, ticket: Ticket, result: std::result::Result<Vec<T>, ApiError>) -> Result<bool> {
        if !self.query.is_current(ticket) {
            tracing::debug!("discarding superseded response");
            return Ok(false);
        }
        let mut st = self.lock()?;
        st.loading = false;
        match result {
            Ok(items) => {
                st.items.replace_all(items);
                st.source = DataSource::Server;
                st.error = None;
                Ok(true)
            }
            Err(e) => {
                st.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub(crate) async fn fetch<Fut>(&self, request: Fut) -> Result<bool>
    where
        Fut: Future<Output = std::result::Result<Vec<T>, ApiError>>,
    {
        let ticket = self.start_fetch()?;
        let result = request.await;
        self.finish_fetch(ticket, result)
    }

    /// Idle -> Pending. `None` from `begin` means the target is not in the list.
    pub(crate) fn begin<F>(&self, begin: F) -> Result<Mutation<T>>
    where
        F: FnOnce(&mut OptimisticList<T>) -> Option<Mutation<T>>,
    {
        let mut st = self.lock()?;
        let begun = begin(&mut st.items);
        match begun {
            Some(mutation) => {
                st.error = None;
                st.last_mutation = mutation.state();
                Ok(mutation)
            }
            None => {
                drop(st);
                Err(self.fail(ClientError::NotFound("Record".into())))
            }
        }
    }

    /// Pending -> Confirmed or RolledBack.
    pub(crate) fn settle(
        &self,
        mut mutation: Mutation<T>,
        result: std::result::Result<Option<T>, ApiError>,
    ) -> Result<Settled> {
        let mut st = self.lock()?;
        match result {
            Ok(server) => {
                let settled = st.items.confirm(&mut mutation, server);
                st.last_mutation = mutation.state();
                Ok(settled)
            }
            Err(e) => {
                st.items.rollback(&mut mutation);
                st.last_mutation = mutation.state();
                st.error = Some(e.to_string());
                tracing::warn!(error = %e, "mutation rolled back");
                Err(e.into())
            }
        }
    }

    /// Confirm against the local copy: the optimistic change stands as is.
    pub(crate) fn keep_local(&self, mut mutation: Mutation<T>) -> Result<()> {
        let mut st = self.lock()?;
        let local = mutation.temp_id().and_then(|id| st.items.get(id).cloned());
        st.items.confirm(&mut mutation, local);
        st.last_mutation = mutation.state();
        Ok(())
    }

    pub(crate) async fn mutate<B, Fut>(&self, begin: B, request: Fut) -> Result<Settled>
    where
        B: FnOnce(&mut OptimisticList<T>) -> Option<Mutation<T>>,
        Fut: Future<Output = std::result::Result<Option<T>, ApiError>>,
    {
        let mutation = self.begin(begin)?;
        let result = request.await;
        self.settle(mutation, result)
    }

    pub(crate) fn item(&self, id: &EntityId) -> Result<Option<T>> {
        Ok(self.lock()?.items.get(id).cloned())
    }
}
