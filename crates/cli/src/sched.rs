// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proactive refresh scheduling: refresh ahead of expiry so the common
//! case never sees a 401.
//!
//! One task per active session. It sleeps until the low-water mark before
//! the current token's expiry, but never longer than the fallback
//! interval, so a missed one-shot (sleep/suspend skew) is repaired on the
//! next fallback tick. The task ends on cancellation or when the session
//! becomes unrecoverable.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::SessionManager;
use crate::token;

/// Spawn the refresh scheduler for an active session.
pub fn spawn(session: Arc<SessionManager>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { run(session, shutdown).await })
}

async fn run(session: Arc<SessionManager>, shutdown: CancellationToken) {
    info!("refresh scheduler started");
    // Floor applied after a successful refresh so a backend issuing
    // tokens shorter-lived than the low-water mark cannot spin the loop.
    let mut floor = Duration::ZERO;

    loop {
        let Some(access) = session.store().access_token() else {
            debug!("no active session, scheduler stopping");
            return;
        };

        let ttl = token::time_until_expiry(Some(&access));
        let until_refresh = ttl.saturating_sub(session.low_water());
        let sleep_for = until_refresh.min(session.fallback_interval()).max(floor);

        if !sleep_for.is_zero() {
            debug!(sleep_secs = sleep_for.as_secs(), "sleeping until next refresh");
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.cancelled() => {
                    debug!("shutdown, scheduler stopping");
                    return;
                }
            }
        }
        if shutdown.is_cancelled() {
            return;
        }

        match session.refresher().refresh().await {
            Ok(_) => {
                floor = Duration::from_secs(1);
            }
            Err(e) if e.is_fatal() => {
                warn!(err = %e, "refresh unrecoverable, scheduler stopping");
                return;
            }
            Err(e) => {
                warn!(err = %e, "refresh failed, backing off");
                tokio::select! {
                    _ = tokio::time::sleep(session.retry_backoff()) => {}
                    _ = shutdown.cancelled() => return,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "sched_tests.rs"]
mod tests;
