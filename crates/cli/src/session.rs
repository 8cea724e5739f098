// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifetime: login, logout, events, and component wiring.
//!
//! One [`SessionManager`] per application (or per test). It owns the
//! token store, the refresh coordinator, the request wrapper, and the
//! scheduler handle. No other session state exists in the crate.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::AuthError;
use crate::profile::AdminUser;
use crate::refresh::RefreshCoordinator;
use crate::store::TokenStore;

/// Session lifecycle notifications for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new access token was stored.
    Refreshed,
    /// A refresh attempt failed. Fatal failures are followed by
    /// `ReauthRequired` or a cleared session; the rest are transient.
    RefreshFailed { error: String },
    /// The session ended and credentials must be re-entered.
    ReauthRequired,
    /// The user logged out.
    LoggedOut,
}

/// Response from `POST /auth/admin-login/`.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<AdminUser>,
}

pub struct SessionManager {
    store: Arc<TokenStore>,
    refresher: Arc<RefreshCoordinator>,
    api: ApiClient,
    http: reqwest::Client,
    base_url: String,
    event_tx: broadcast::Sender<SessionEvent>,
    low_water: Duration,
    fallback_interval: Duration,
    retry_backoff: Duration,
    /// Cancels the proactive scheduler when the session ends.
    sched_shutdown: Mutex<Option<CancellationToken>>,
}

impl SessionManager {
    pub fn new(config: &Config) -> anyhow::Result<Arc<Self>> {
        let http = reqwest::Client::builder().timeout(config.http_timeout()).build()?;
        let (event_tx, _) = broadcast::channel(64);
        let base_url = config.base_url();

        let store = Arc::new(TokenStore::open(config.session_file()));
        let refresher = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &base_url,
            Arc::clone(&store),
            event_tx.clone(),
        ));
        let api = ApiClient::new(
            http.clone(),
            &base_url,
            Arc::clone(&store),
            Arc::clone(&refresher),
            event_tx.clone(),
            config.refresh_margin(),
        );

        Ok(Arc::new(Self {
            store,
            refresher,
            api,
            http,
            base_url,
            event_tx,
            low_water: config.refresh_margin(),
            fallback_interval: config.fallback_interval(),
            retry_backoff: config.refresh_backoff(),
            sched_shutdown: Mutex::new(None),
        }))
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn refresher(&self) -> &Arc<RefreshCoordinator> {
        &self.refresher
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn low_water(&self) -> Duration {
        self.low_water
    }

    pub(crate) fn fallback_interval(&self) -> Duration {
        self.fallback_interval
    }

    pub(crate) fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// Authenticate against `POST /auth/admin-login/` and store the
    /// issued tokens plus the user payload.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let url = format!("{}/auth/admin-login/", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("login request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("login body: {e}")))?;
        if !status.is_success() {
            return Err(AuthError::RequestFailed { status: status.as_u16(), body });
        }

        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::Network(format!("login response: {e}")))?;
        self.store.save(login.access_token, Some(login.refresh_token));
        let user = login.user.unwrap_or_default();
        self.store.save_user(user.clone());
        info!(email, "admin login succeeded");
        Ok(user)
    }

    /// Start the proactive refresh scheduler for this session, replacing
    /// any previous one.
    pub fn start_scheduler(self: &Arc<Self>) -> CancellationToken {
        let shutdown = CancellationToken::new();
        if let Some(prev) = self.sched_shutdown.lock().replace(shutdown.clone()) {
            prev.cancel();
        }
        crate::sched::spawn(Arc::clone(self), shutdown.clone());
        shutdown
    }

    /// End the session: cancel timers, clear tokens, notify subscribers.
    pub fn logout(&self) {
        if let Some(shutdown) = self.sched_shutdown.lock().take() {
            shutdown.cancel();
        }
        self.store.clear();
        let _ = self.event_tx.send(SessionEvent::LoggedOut);
        info!("logged out, session cleared");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
