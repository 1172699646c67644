//! # campus-store
//!
//! Durable client storage for the campus client, backed by SQLite.
//!
//! Two logical key spaces live in one database file: the `session` space
//! (stored user object and standalone bearer token) and the `cache` space
//! (the events mirror). A small ledger remembers which cached events have
//! already been pushed back to the server. Keys and JSON shapes are private
//! to this client, not a wire contract.

pub mod database;
pub mod events_cache;
pub mod migrations;
pub mod models;
pub mod session;
pub mod slots;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use slots::KeySpace;
