//! Application state shared by every screen.
//!
//! [`AppState`] wires together the configuration, the HTTP client, the
//! session handle and the local database. Screens are built from it and
//! share its handles; nothing here is global.

use std::sync::{Arc, Mutex};

use campus_store::Database;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::screens::{AuthScreen, EventsScreen, FeedScreen, NewsScreen, OpportunitiesScreen, ProfileScreen, ResourcesScreen};
use crate::session::SessionHandle;

/// Database handle shared between the session store and the events cache.
/// Critical sections are short and never span an `.await`.
pub type SharedDatabase = Arc<Mutex<Database>>;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub session: SessionHandle,
    pub database: SharedDatabase,
}

impl AppState {
    /// Open the configured database (or the platform default) and restore
    /// any stored session.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let db = match config.db_path {
            Some(ref path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        Self::with_database(config, db)
    }

    pub fn with_database(config: ClientConfig, db: Database) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let database = Arc::new(Mutex::new(db));
        let session = SessionHandle::restore(database.clone());
        tracing::info!(api_url = %api.base_url(), "Client state ready");
        Ok(Self {
            config,
            api,
            session,
            database,
        })
    }

    pub fn auth(&self) -> AuthScreen {
        AuthScreen::new(self)
    }

    pub fn feed(&self) -> FeedScreen {
        FeedScreen::new(self)
    }

    pub fn events(&self) -> EventsScreen {
        EventsScreen::new(self)
    }

    pub fn news(&self) -> NewsScreen {
        NewsScreen::new(self)
    }

    pub fn resources(&self) -> ResourcesScreen {
        ResourcesScreen::new(self)
    }

    pub fn opportunities(&self) -> OpportunitiesScreen {
        OpportunitiesScreen::new(self)
    }

    pub fn profile(&self) -> ProfileScreen {
        ProfileScreen::new(self)
    }
}
