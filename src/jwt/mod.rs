//! Client-side JWT inspection
//!
//! The client never holds the signing key, so claims are read without
//! signature verification. The result is only used to decide whether a
//! stored token is worth sending; the backend remains the authority.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Claims the client cares about; anything else is ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Tenant the token was issued for, if any
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Expiration (Unix timestamp)
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// Expired when `exp` is at or before `now`; tokens without `exp` never expire
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.exp, Some(exp) if exp <= now)
    }
}

/// Decode the payload segment of a compact JWT without verifying it
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => {
            return Err(ApiError::Decode(
                "Token is not a three-segment JWT".to_string(),
            ))
        }
    };

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ApiError::Decode(format!("Invalid token payload encoding: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(format!("Invalid token claims: {}", e)))
}
