use thiserror::Error;

use campus_shared::error::ValidationError;
use campus_store::StoreError;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("You must be logged in")]
    Unauthenticated,

    #[error("Admin access required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl ClientError {
    pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> Self {
        ClientError::LockPoisoned(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
