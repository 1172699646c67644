//! Pre-flight form checks. Nothing here touches the network; a failure means
//! the request is never sent.

use crate::constants::MIN_PASSWORD_LEN;
use crate::error::ValidationError;

pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Accepts absolute `http`/`https` URLs with a non-empty host.
pub fn url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .ok_or(ValidationError::InvalidUrl { field })?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidUrl { field });
    }
    Ok(())
}

/// Optional URL fields: empty is fine, anything else must parse.
pub fn optional_url(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(()),
        Some(v) => url(field, v),
    }
}

pub fn new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    require("Password", password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
