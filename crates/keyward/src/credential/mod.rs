// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application registration and bearer credential lifecycle.

pub mod coordinator;
pub mod exchange;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::environment::Environment;

/// Per-installation identifier/secret pair issued once by the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRegistration {
    pub identifier: String,
    pub secret: String,
}

impl std::fmt::Debug for AppRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRegistration")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The only scope this client ever requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[default]
    #[serde(alias = "bearer")]
    Bearer,
}

/// Short-lived bearer token derived from an [`AppRegistration`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCredential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(rename = "type", default)]
    pub token_type: TokenType,
}

impl AccessCredential {
    /// Valid iff `now < expires_at`. No clock-skew grace.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Seconds until expiry, or `None` once expired.
    pub fn expires_in_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        let remaining = (self.expires_at - now).num_seconds();
        if self.is_valid_at(now) {
            Some(remaining.max(0) as u64)
        } else {
            None
        }
    }

    /// Value for the `authorization` header.
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Events emitted by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CredentialEvent {
    /// A new credential was fetched and stored.
    Refreshed { expires_at: DateTime<Utc> },
    /// A refresh attempt failed; the cache was left untouched.
    #[serde(rename = "refresh:failed")]
    RefreshFailed { error: String },
    /// Cached and persisted state was cleared.
    Reset,
}

/// Point-in-time view of the coordinator, without secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub environment: Environment,
    pub base_url: String,
    pub registered: bool,
    pub refreshing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialInfo {
    pub expires_at: DateTime<Utc>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
