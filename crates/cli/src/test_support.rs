// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: token builders and mock backend helpers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::routing::post;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::net::TcpListener;

/// Build a dot-delimited token whose payload carries the given `exp`.
///
/// Header and signature are structurally present but meaningless; the
/// inspector never validates them.
pub fn make_token(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
    let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
    format!("{header}.{payload}.sig")
}

/// A token that is comfortably inside its lifetime.
pub fn fresh_token() -> String {
    make_token(crate::token::epoch_secs() + 3600)
}

/// A token whose expiry is already in the past.
pub fn stale_token() -> String {
    make_token(crate::token::epoch_secs().saturating_sub(10))
}

/// Serve an axum router on an ephemeral port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

/// Routes serving `POST /auth/token/refresh/` from a canned response list,
/// repeating the last entry once exhausted. Returns the call counter.
///
/// `delay` holds each response back, leaving a window for concurrent
/// callers (or a mid-flight logout) to pile up.
pub fn refresh_routes(
    responses: Vec<(u16, String)>,
    delay: Duration,
) -> (Router, Arc<AtomicU32>) {
    let call_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&call_count);
    let responses = Arc::new(responses);

    let app = Router::new().route(
        "/auth/token/refresh/",
        post(move |_body: String| {
            let counter = Arc::clone(&counter);
            let resps = Arc::clone(&responses);
            async move {
                let idx = counter.fetch_add(1, Ordering::Relaxed) as usize;
                let (status, body) = if idx < resps.len() {
                    resps[idx].clone()
                } else {
                    resps.last().cloned().unwrap_or((500, "{}".to_owned()))
                };
                tokio::time::sleep(delay).await;
                (
                    axum::http::StatusCode::from_u16(status)
                        .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
                    body,
                )
            }
        }),
    );

    (app, call_count)
}

/// Canned success body for the refresh endpoint.
pub fn refresh_ok_body(access: &str) -> String {
    serde_json::json!({ "access_token": access }).to_string()
}
