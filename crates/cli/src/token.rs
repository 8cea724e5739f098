// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access token inspection: expiry claims, decoded for scheduling only.
//!
//! Decoding is base64url + JSON on the middle segment of a dot-delimited
//! token. It is not a signature check: claims are trusted only to decide
//! when to refresh, never for authorization.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::AuthError;

/// Claims read from the token payload. Only `exp` matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<u64>,
}

/// Decode the payload segment of a dot-delimited token.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(AuthError::TokenDecode(
                "token is not three dot-separated segments".to_owned(),
            ))
        }
    };
    // Issuers disagree on padding; strip it and decode unpadded.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::TokenDecode(format!("payload base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::TokenDecode(format!("payload json: {e}")))
}

/// Whether the token should be treated as expired.
///
/// Fails closed: absent or undecodable tokens (and tokens with no `exp`
/// claim) are expired. `margin` shaves lead time off the real expiry so
/// requests in flight at the deadline don't race it.
pub fn is_expired(token: Option<&str>, margin: Duration) -> bool {
    let Some(token) = token else {
        return true;
    };
    match decode_claims(token) {
        Ok(Claims { exp: Some(exp) }) => epoch_secs() + margin.as_secs() >= exp,
        _ => true,
    }
}

/// Seconds until the token's real expiry (no margin applied).
///
/// Zero when the token is absent, undecodable, or already past.
pub fn time_until_expiry(token: Option<&str>) -> Duration {
    let Some(token) = token else {
        return Duration::ZERO;
    };
    match decode_claims(token) {
        Ok(Claims { exp: Some(exp) }) => Duration::from_secs(exp.saturating_sub(epoch_secs())),
        _ => Duration::ZERO,
    }
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
