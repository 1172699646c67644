use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is not a three-segment JWT")]
    Malformed,

    #[error("Token payload is not valid base64url")]
    Base64Decode,

    #[error("Token payload is not valid JSON: {0}")]
    Payload(String),

    #[error("Token carries no expiry claim")]
    MissingExpiry,

    #[error("Token has expired")]
    Expired,
}

/// Errors caught before any request is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please enter a valid URL for {field}")]
    InvalidUrl { field: &'static str },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}
