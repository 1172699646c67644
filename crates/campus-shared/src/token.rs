//! Bearer-token inspection.
//!
//! The client never verifies token signatures; it only reads the payload
//! segment to decide whether a stored token is still worth presenting.
//! Every decode failure counts as expired.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::types::Role;

/// Claims the client cares about. Unknown claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Decode the middle segment of a JWT.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let bytes = base64_url_decode(payload)?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Check a token against `now`. Fail-closed: anything undecodable is an error.
pub fn check_expiry_at(token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
    let claims = decode_claims(token)?;
    let expires_at = claims.expires_at().ok_or(TokenError::MissingExpiry)?;
    if expires_at <= now {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    check_expiry_at(token, now).is_err()
}

pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

// Tokens issued by some encoders keep the `=` padding; strip it before decoding.
fn base64_url_decode(s: &str) -> Result<Vec<u8>, TokenError> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    URL_SAFE_NO_PAD
        .decode(s.trim().trim_end_matches('='))
        .map_err(|_| TokenError::Base64Decode)
}

/// Build an unsigned token carrying the given claims. Test and tooling helper.
pub fn encode_unsigned(claims: &serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_token_valid() {
        let exp = (Utc::now() + Duration::days(30)).timestamp();
        let token = encode_unsigned(&json!({ "user_id": "u1", "exp": exp, "role": "admin" }));

        let claims = check_expiry_at(&token, Utc::now()).expect("token should be valid");
        assert_eq!(claims.user_id.as_deref(), Some("u1"));
        assert_eq!(claims.role, Some(Role::Admin));
        assert!(!is_expired(&token));
    }

    #[test]
    fn test_token_expired() {
        let exp = (Utc::now() - Duration::minutes(1)).timestamp();
        let token = encode_unsigned(&json!({ "exp": exp }));

        assert_eq!(check_expiry_at(&token, Utc::now()), Err(TokenError::Expired));
        assert!(is_expired(&token));
    }

    #[test]
    fn test_garbage_counts_as_expired() {
        assert!(is_expired("dummy-jwt-token"));
        assert!(is_expired("a.!!!.c"));
        assert!(is_expired(""));
    }

    #[test]
    fn test_missing_exp_counts_as_expired() {
        let token = encode_unsigned(&json!({ "user_id": "u1" }));
        assert_eq!(
            check_expiry_at(&token, Utc::now()),
            Err(TokenError::MissingExpiry)
        );
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        use base64::engine::general_purpose::URL_SAFE;
        use base64::Engine;
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let payload = URL_SAFE.encode(json!({ "exp": exp }).to_string());
        let token = format!("h.{payload}.s");
        assert!(!is_expired(&token));
    }
}
