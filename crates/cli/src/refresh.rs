// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token refresh: one network round-trip no matter how many callers ask.
//!
//! The proactive scheduler and the 401 handler both land here. Whoever
//! acquires the flight lock performs the exchange; callers queued behind
//! it observe the bumped serial and receive the recorded outcome instead
//! of issuing their own request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::session::SessionEvent;
use crate::store::TokenStore;

/// Successful response from the refresh endpoint. Older deployments send
/// the new token as `access`, newer ones as `access_token`; accept both.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(alias = "access")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Idle/Refreshing coordinator for the refresh endpoint.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: String,
    store: Arc<TokenStore>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Held for the duration of one exchange; queued callers share its result.
    flight: Mutex<Option<Result<String, AuthError>>>,
    /// Completed exchanges since startup.
    serial: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<TokenStore>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            http,
            refresh_url: format!("{}/auth/token/refresh/", base_url.trim_end_matches('/')),
            store,
            event_tx,
            flight: Mutex::new(None),
            serial: AtomicU64::new(0),
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Concurrent callers collapse into a single network call and all
    /// receive the same outcome, success or failure. A rejected refresh
    /// token clears the store; transport failures leave it untouched.
    pub async fn refresh(&self) -> Result<String, AuthError> {
        let seen = self.serial.load(Ordering::Acquire);
        let mut flight = self.flight.lock().await;

        // An exchange completed while we waited for the lock: share it.
        if self.serial.load(Ordering::Acquire) != seen {
            if let Some(outcome) = flight.clone() {
                debug!("refresh already satisfied by concurrent caller");
                return outcome;
            }
        }

        let outcome = self.exchange().await;
        *flight = Some(outcome.clone());
        self.serial.fetch_add(1, Ordering::Release);

        match &outcome {
            Ok(_) => {
                let _ = self.event_tx.send(SessionEvent::Refreshed);
            }
            Err(e) => {
                let _ = self
                    .event_tx
                    .send(SessionEvent::RefreshFailed { error: e.to_string() });
            }
        }
        outcome
    }

    /// One network exchange against the refresh endpoint.
    async fn exchange(&self) -> Result<String, AuthError> {
        let Some(refresh_token) = self.store.refresh_token() else {
            // Nothing to refresh with: a lone access token is not a
            // session. End it.
            self.store.clear();
            return Err(AuthError::NoRefreshToken);
        };

        debug!(url = %self.refresh_url, "refreshing access token");
        let resp = self
            .http
            .post(&self.refresh_url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("refresh request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("refresh body: {e}")))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(%status, "refresh token rejected, clearing session");
            self.store.clear();
            return Err(AuthError::RefreshRejected);
        }
        if !status.is_success() {
            return Err(AuthError::Network(format!("refresh failed ({status}): {body}")));
        }

        let token: RefreshResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::Network(format!("refresh response: {e}")))?;

        // The session may have ended while the request was in flight
        // (logout). Discard the result rather than resurrecting it.
        if self.store.refresh_token().is_none() {
            debug!("session cleared mid-refresh, discarding result");
            return Err(AuthError::NotAuthenticated);
        }

        self.store.save(token.access_token.clone(), token.refresh_token);
        info!("access token refreshed");
        Ok(token.access_token)
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
