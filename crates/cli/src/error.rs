// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Errors raised by the session, refresh, and request layers.
///
/// Fatal variants end the session (tokens cleared, re-login required);
/// the rest are transient and leave the stored session untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No access token is stored. The request was never attempted.
    NotAuthenticated,
    /// The access token payload could not be decoded. Treated as expired
    /// by the inspector, never surfaced to users as a hard failure.
    TokenDecode(String),
    /// A refresh was requested with no refresh token stored.
    NoRefreshToken,
    /// The backend rejected the refresh token itself.
    RefreshRejected,
    /// Transport-level failure (connect, timeout, malformed body).
    Network(String),
    /// Any non-2xx response other than 401. Propagated verbatim, no retry.
    RequestFailed { status: u16, body: String },
    /// A 401 was followed by a failed refresh. The session is cleared.
    AuthenticationFailed,
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::TokenDecode(_) => "TOKEN_DECODE",
            Self::NoRefreshToken => "NO_REFRESH_TOKEN",
            Self::RefreshRejected => "REFRESH_REJECTED",
            Self::Network(_) => "NETWORK",
            Self::RequestFailed { .. } => "REQUEST_FAILED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
        }
    }

    /// Whether this error ends the session.
    ///
    /// Fatal errors are handled once at the coordinator/wrapper boundary
    /// (clear tokens, emit [`crate::session::SessionEvent::ReauthRequired`]);
    /// callers above that never need their own 401 handling.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::NoRefreshToken
                | Self::RefreshRejected
                | Self::AuthenticationFailed
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenDecode(detail) => write!(f, "{}: {detail}", self.as_str()),
            Self::Network(detail) => write!(f, "{}: {detail}", self.as_str()),
            Self::RequestFailed { status, body } => {
                write!(f, "{}: status {status}: {body}", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
