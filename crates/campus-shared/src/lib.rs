//! # campus-shared
//!
//! Types shared by every layer of the campus client: wire models mirrored
//! from the REST backend, entity identifiers, bearer-token decoding,
//! pre-flight validation and the local sentiment estimator.

pub mod constants;
pub mod error;
pub mod models;
pub mod sentiment;
pub mod token;
pub mod types;
pub mod validation;

pub use error::{TokenError, ValidationError};
pub use types::{EntityId, Role};
