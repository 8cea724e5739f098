// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin user and profile models, and the profile endpoint calls.
//!
//! The profile endpoint is the canonical consumer of the authenticated
//! request wrapper: every call here goes through [`ApiClient::call`] and
//! inherits its refresh and retry behavior.

use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, RequestOptions};
use crate::error::AuthError;

/// User payload returned by the login endpoint, cached in the session file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl AdminUser {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

/// Admin profile as served by `GET /auth/profile/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Fields accepted by `PUT /auth/profile/`. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

/// `GET /auth/profile/`.
pub async fn fetch(api: &ApiClient) -> Result<Profile, AuthError> {
    let value = api.get("/auth/profile/").await?;
    serde_json::from_value(value).map_err(|e| AuthError::Network(format!("profile payload: {e}")))
}

/// `PUT /auth/profile/` with a partial update.
pub async fn update(api: &ApiClient, update: &ProfileUpdate) -> Result<Profile, AuthError> {
    let body = serde_json::to_value(update)
        .map_err(|e| AuthError::Network(format!("profile update: {e}")))?;
    let value = api.call(reqwest::Method::PUT, "/auth/profile/", RequestOptions::json(body)).await?;
    serde_json::from_value(value).map_err(|e| AuthError::Network(format!("profile payload: {e}")))
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
