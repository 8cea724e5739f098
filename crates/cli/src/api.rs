// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated request wrapper: bearer attachment, refresh-before-send
//! for stale tokens, and the single 401 retry.
//!
//! UI-facing callers never handle 401s themselves. Either a call comes
//! back with a body, or it comes back with a typed [`AuthError`]. A
//! fatal error means the session is already cleared and the re-auth
//! signal already emitted.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::refresh::RefreshCoordinator;
use crate::session::SessionEvent;
use crate::store::TokenStore;
use crate::token;

/// Body forms accepted by [`ApiClient::call`].
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// JSON payload; Content-Type defaults to `application/json`.
    Json(serde_json::Value),
    /// Raw bytes; Content-Type is left unset so the transport layer can
    /// supply the correct one (e.g. a multipart boundary).
    Raw(Vec<u8>),
}

/// Options for a single wrapped request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers, applied after the defaults so they are never dropped.
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn json(body: serde_json::Value) -> Self {
        Self { headers: Vec::new(), body: RequestBody::Json(body) }
    }
}

/// Issues authenticated requests against the marketplace API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
    refresher: Arc<RefreshCoordinator>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Tokens within this margin of expiry are refreshed before sending.
    expiry_margin: Duration,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<TokenStore>,
        refresher: Arc<RefreshCoordinator>,
        event_tx: broadcast::Sender<SessionEvent>,
        expiry_margin: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            store,
            refresher,
            event_tx,
            expiry_margin,
        }
    }

    /// Issue an authenticated request and return the parsed JSON body.
    ///
    /// Refuses with [`AuthError::NotAuthenticated`] when no token is
    /// stored. A token the inspector reports expired is refreshed before
    /// the first attempt. A 401 response triggers exactly one refresh and
    /// exactly one retry; if the refresh fails, the session is cleared,
    /// [`SessionEvent::ReauthRequired`] is emitted, and the call fails
    /// with [`AuthError::AuthenticationFailed`].
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<serde_json::Value, AuthError> {
        let mut access = self.store.access_token().ok_or(AuthError::NotAuthenticated)?;

        if token::is_expired(Some(&access), self.expiry_margin) {
            debug!(%method, path, "access token stale, refreshing before send");
            access = self.refresher.refresh().await?;
        }

        let resp = self.send(method.clone(), path, &opts, &access).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return read_body(resp).await;
        }

        // Reactive path: refresh once, retry once.
        debug!(%method, path, "request unauthorized, refreshing once");
        let access = match self.refresher.refresh().await {
            Ok(token) => token,
            Err(e) => {
                warn!(%method, path, err = %e, "refresh after 401 failed, ending session");
                self.store.clear();
                let _ = self.event_tx.send(SessionEvent::ReauthRequired);
                return Err(AuthError::AuthenticationFailed);
            }
        };
        let retry = self.send(method, path, &opts, &access).await?;
        read_body(retry).await
    }

    pub async fn get(&self, path: &str) -> Result<serde_json::Value, AuthError> {
        self.call(Method::GET, path, RequestOptions::default()).await
    }

    pub async fn put_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        self.call(Method::PUT, path, RequestOptions::json(body)).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        self.call(Method::POST, path, RequestOptions::json(body)).await
    }

    /// Build and send one attempt with the given bearer token.
    async fn send(
        &self,
        method: Method,
        path: &str,
        opts: &RequestOptions,
        access: &str,
    ) -> Result<reqwest::Response, AuthError> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HeaderMap::new();
        for (name, value) in &opts.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AuthError::Network(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AuthError::Network(format!("header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut req = self.http.request(method.clone(), &url).bearer_auth(access);
        match &opts.body {
            RequestBody::Empty => {}
            RequestBody::Json(value) => {
                // Default the content type, but let a caller-supplied one win.
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| AuthError::Network(format!("request body: {e}")))?;
                req = req.body(bytes);
            }
            RequestBody::Raw(bytes) => {
                req = req.body(bytes.clone());
            }
        }

        req.headers(headers)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("{method} {path}: {e}")))
    }
}

/// Map a response to the caller's result: 2xx parses as JSON, anything
/// else is [`AuthError::RequestFailed`] with the body attached verbatim.
async fn read_body(resp: reqwest::Response) -> Result<serde_json::Value, AuthError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| AuthError::Network(format!("response body: {e}")))?;

    if !status.is_success() {
        return Err(AuthError::RequestFailed { status: status.as_u16(), body });
    }
    if body.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| AuthError::Network(format!("response json: {e}")))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
