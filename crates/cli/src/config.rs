// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::store;

/// Admin session client for the Pomade marketplace API.
#[derive(Debug, Parser)]
#[command(name = "pomade", version, about)]
pub struct Config {
    /// Base URL of the marketplace API.
    #[arg(long, env = "POMADE_API_URL", default_value = "https://api.pomade.app")]
    pub api_url: String,

    /// Directory for session state (defaults to the platform state dir).
    #[arg(long, env = "POMADE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// HTTP timeout in milliseconds. Also bounds how long a refresh in
    /// flight can block other callers.
    #[arg(long, env = "POMADE_HTTP_TIMEOUT_MS", default_value = "10000")]
    pub http_timeout_ms: u64,

    /// Lead time in seconds: a token within this window of expiry is
    /// treated as expired and refreshed ahead of use.
    #[arg(long, env = "POMADE_REFRESH_MARGIN_SECS", default_value = "300")]
    pub refresh_margin_secs: u64,

    /// Fallback refresh interval in seconds, a backstop against missed
    /// one-shot timers.
    #[arg(long, env = "POMADE_FALLBACK_REFRESH_SECS", default_value = "3600")]
    pub fallback_refresh_secs: u64,

    /// Backoff in seconds after a failed proactive refresh.
    #[arg(long, env = "POMADE_REFRESH_BACKOFF_SECS", default_value = "60")]
    pub refresh_backoff_secs: u64,

    /// Log format (json or text).
    #[arg(long, env = "POMADE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "POMADE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session.
    Login {
        /// Admin account email.
        #[arg(long, env = "POMADE_EMAIL")]
        email: String,
        /// Admin account password.
        #[arg(long, env = "POMADE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the stored session.
    Logout,
    /// Show session status and token expiry.
    Status,
    /// Show the logged-in admin user.
    Whoami,
    /// Read or update the admin profile.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Keep the session fresh in the foreground until interrupted.
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Fetch and print the profile.
    Show,
    /// Update one or more profile fields.
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.trim().is_empty() {
            anyhow::bail!("--api-url must not be empty");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other} (expected json or text)"),
        }
        if self.fallback_refresh_secs == 0 {
            anyhow::bail!("--fallback-refresh-secs must be positive");
        }
        Ok(())
    }

    /// API base URL with any trailing slash removed.
    pub fn base_url(&self) -> String {
        self.api_url.trim_end_matches('/').to_owned()
    }

    /// Path of the persisted session file.
    pub fn session_file(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(store::state_dir).join("session.json")
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_refresh_secs)
    }

    pub fn refresh_backoff(&self) -> Duration {
        Duration::from_secs(self.refresh_backoff_secs)
    }

    /// Build a minimal `Config` for tests.
    #[doc(hidden)]
    pub fn test(api_url: &str, state_dir: PathBuf) -> Self {
        Self {
            api_url: api_url.to_owned(),
            state_dir: Some(state_dir),
            http_timeout_ms: 2_000,
            refresh_margin_secs: 300,
            fallback_refresh_secs: 3_600,
            refresh_backoff_secs: 60,
            log_format: "text".into(),
            log_level: "debug".into(),
            command: Command::Status,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
