// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommand handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{Command, Config, ProfileCommand};
use crate::error::AuthError;
use crate::profile::{self, ProfileUpdate};
use crate::session::SessionManager;
use crate::token;

/// Dispatch the parsed subcommand.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let session = SessionManager::new(&config)?;
    match &config.command {
        Command::Login { email, password } => login(&session, email, password).await,
        Command::Logout => {
            session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Status => status(&session, &config),
        Command::Whoami => whoami(&session).await,
        Command::Profile { command } => match command {
            ProfileCommand::Show => profile_show(&session).await,
            ProfileCommand::Update { first_name, last_name, phone } => {
                let update = ProfileUpdate {
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    phone: phone.clone(),
                };
                profile_update(&session, update).await
            }
        },
        Command::Watch => watch(&session).await,
    }
}

async fn login(session: &Arc<SessionManager>, email: &str, password: &str) -> anyhow::Result<()> {
    let user = session.login(email, password).await?;
    println!("logged in as {}", user.display_name());
    Ok(())
}

fn status(session: &Arc<SessionManager>, config: &Config) -> anyhow::Result<()> {
    if !session.is_authenticated() {
        println!("not logged in");
        return Ok(());
    }
    let access = session.store().access_token();
    let ttl = token::time_until_expiry(access.as_deref());
    println!("logged in");
    println!("access token expires in {}", format_ttl(ttl));
    println!("session file: {}", config.session_file().display());
    Ok(())
}

async fn whoami(session: &Arc<SessionManager>) -> anyhow::Result<()> {
    if !session.is_authenticated() {
        println!("not logged in");
        return Ok(());
    }
    // Prefer the user cached at login; fall back to the profile endpoint.
    if let Some(user) = session.store().user() {
        println!("{} <{}>", user.display_name(), user.email);
        return Ok(());
    }
    debug!("no cached user, fetching profile");
    let profile = profile::fetch(session.api()).await?;
    println!("{} {} <{}>", profile.first_name, profile.last_name, profile.email);
    Ok(())
}

async fn profile_show(session: &Arc<SessionManager>) -> anyhow::Result<()> {
    let profile = profile::fetch(session.api()).await?;
    println!("email:      {}", profile.email);
    println!("first name: {}", profile.first_name);
    println!("last name:  {}", profile.last_name);
    println!("phone:      {}", profile.phone.as_deref().unwrap_or("\u{2014}"));
    Ok(())
}

async fn profile_update(
    session: &Arc<SessionManager>,
    update: ProfileUpdate,
) -> anyhow::Result<()> {
    if update.is_empty() {
        anyhow::bail!("nothing to update: pass at least one of --first-name/--last-name/--phone");
    }
    let profile = profile::update(session.api(), &update).await?;
    println!("profile updated: {} {} <{}>", profile.first_name, profile.last_name, profile.email);
    Ok(())
}

/// Run the proactive refresh scheduler in the foreground until Ctrl-C.
async fn watch(session: &Arc<SessionManager>) -> anyhow::Result<()> {
    if !session.is_authenticated() {
        anyhow::bail!(AuthError::NotAuthenticated);
    }
    let shutdown = session.start_scheduler();
    println!("keeping session fresh, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    shutdown.cancel();
    Ok(())
}

fn format_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    if secs == 0 {
        return "now (expired)".to_owned();
    }
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}h {m:02}m")
    } else {
        format!("{m}m {s:02}s")
    }
}
