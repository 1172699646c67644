//! Client core for the campus social network.
//!
//! [`AppState`] is the entry point: it restores the stored session and hands
//! out one screen per feature area. Screens keep their own list state and
//! apply edits optimistically through [`engine::OptimisticList`].

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod query;
pub mod screens;
pub mod session;
pub mod state;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use session::{Session, SessionHandle, SessionSnapshot};
pub use state::AppState;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campus_client=debug,campus_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
