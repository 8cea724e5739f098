// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token store: single owner of the persisted session.
//!
//! Both tokens live in one JSON file under the state dir. All other
//! components read and write them through this store; nothing caches a
//! token beyond the scope of a single operation.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::profile::AdminUser;

/// Persisted session state: the two opaque credentials plus the user
/// payload cached from login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AdminUser>,
}

/// Read/write access to the session file, with a write-through in-memory
/// copy. Reads never fail: a missing or corrupt file is a logged-out
/// session, not an error.
pub struct TokenStore {
    path: PathBuf,
    session: RwLock<Session>,
}

impl TokenStore {
    /// Open the store backed by `path`, loading any persisted session.
    pub fn open(path: PathBuf) -> Self {
        let session = load(&path);
        Self { path, session: RwLock::new(session) }
    }

    /// Snapshot of the current session.
    pub fn tokens(&self) -> Session {
        self.session.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.session.read().refresh_token.clone()
    }

    pub fn user(&self) -> Option<AdminUser> {
        self.session.read().user.clone()
    }

    /// Both tokens present is necessary and sufficient for "authenticated".
    pub fn is_authenticated(&self) -> bool {
        let session = self.session.read();
        session.access_token.is_some() && session.refresh_token.is_some()
    }

    /// Store a new access token, and the refresh token only when provided
    /// (access-only refresh responses keep the old one).
    pub fn save(&self, access_token: String, refresh_token: Option<String>) {
        let snapshot = {
            let mut session = self.session.write();
            session.access_token = Some(access_token);
            if let Some(rt) = refresh_token {
                session.refresh_token = Some(rt);
            }
            session.clone()
        };
        self.persist(&snapshot);
    }

    /// Cache the user payload from a login response.
    pub fn save_user(&self, user: AdminUser) {
        let snapshot = {
            let mut session = self.session.write();
            session.user = Some(user);
            session.clone()
        };
        self.persist(&snapshot);
    }

    /// Remove everything. Idempotent.
    pub fn clear(&self) {
        {
            let mut session = self.session.write();
            *session = Session::default();
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), err = %e, "failed to remove session file");
            }
        }
    }

    /// Write the session file atomically (unique tmp name, then rename).
    ///
    /// Uses PID + counter in the temp filename so concurrent saves cannot
    /// corrupt each other through a shared `.tmp` path.
    fn persist(&self, session: &Session) {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), err = %e, "failed to create state dir");
                return;
            }
        }

        let json = match serde_json::to_string_pretty(session) {
            Ok(j) => j,
            Err(e) => {
                warn!(err = %e, "failed to serialize session");
                return;
            }
        };

        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        if let Err(e) = std::fs::write(&tmp_path, json) {
            warn!(path = %tmp_path.display(), err = %e, "failed to write session file");
            return;
        }
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            warn!(path = %self.path.display(), err = %e, "failed to rename session file");
        }
    }
}

fn load(path: &Path) -> Session {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), "no persisted session: {e}");
            return Session::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(session) => session,
        Err(e) => {
            warn!(path = %path.display(), "failed to parse session file, starting logged out: {e}");
            Session::default()
        }
    }
}

/// Resolve the state directory for session data.
///
/// Checks `POMADE_STATE_DIR`, then `$XDG_STATE_HOME/pomade`,
/// then `$HOME/.local/state/pomade`.
pub fn state_dir() -> PathBuf {
    state_dir_with(|name| std::env::var(name).ok())
}

/// Inner implementation that accepts a lookup function for testability.
fn state_dir_with(get_env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = get_env("POMADE_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = get_env("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("pomade");
    }
    if let Some(home) = get_env("HOME") {
        return PathBuf::from(home).join(".local/state/pomade");
    }
    PathBuf::from(".pomade")
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
