// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::DevConfig;

/// Ten years; keeps `now + ttl` representable.
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

/// A bearer token handed out by `/apps/token`.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub identifier: String,
    pub expires_at: DateTime<Utc>,
}

/// Request counters exposed at `/dev/stats`.
#[derive(Debug, Default)]
pub struct Counters {
    pub registrations: AtomicU64,
    pub token_requests: AtomicU64,
    pub authenticated_requests: AtomicU64,
    pub rejected_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub registrations: u64,
    pub token_requests: u64,
    pub authenticated_requests: u64,
    pub rejected_requests: u64,
    pub active_tokens: usize,
}

/// Shared server state: registered apps and issued tokens.
pub struct DevState {
    pub config: DevConfig,
    /// identifier -> secret
    pub registrations: Mutex<HashMap<String, String>>,
    /// access token -> issue record
    pub tokens: Mutex<HashMap<String, IssuedToken>>,
    pub counters: Counters,
}

impl DevState {
    pub fn new(config: DevConfig) -> Self {
        Self {
            config,
            registrations: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn register(&self) -> (String, String) {
        let identifier = format!("app_{}", uuid::Uuid::new_v4().simple());
        let secret = uuid::Uuid::new_v4().simple().to_string();
        self.registrations.lock().insert(identifier.clone(), secret.clone());
        (identifier, secret)
    }

    /// Secret registered for `identifier`, if any.
    pub fn secret_for(&self, identifier: &str) -> Option<String> {
        self.registrations.lock().get(identifier).cloned()
    }

    /// Issue a token for `identifier`, dropping any that have expired.
    pub fn issue_token(&self, identifier: &str, now: DateTime<Utc>) -> (String, IssuedToken) {
        let secs = i64::try_from(self.config.token_ttl_secs).unwrap_or(MAX_TTL_SECS).min(MAX_TTL_SECS);
        let ttl = chrono::Duration::seconds(secs);
        let token = format!("kw_{}", uuid::Uuid::new_v4().simple());
        let issued = IssuedToken { identifier: identifier.to_owned(), expires_at: now + ttl };
        let mut tokens = self.tokens.lock();
        tokens.retain(|_, t| now < t.expires_at);
        tokens.insert(token.clone(), issued.clone());
        (token, issued)
    }

    /// Look up a token that is known and not yet expired.
    pub fn active_token(&self, token: &str, now: DateTime<Utc>) -> Option<IssuedToken> {
        self.tokens.lock().get(token).filter(|t| now < t.expires_at).cloned()
    }

    /// Forget every issued token. Returns how many were dropped.
    pub fn revoke_all(&self) -> usize {
        let mut tokens = self.tokens.lock();
        let n = tokens.len();
        tokens.clear();
        n
    }

    pub fn stats(&self) -> StatsSnapshot {
        let now = Utc::now();
        StatsSnapshot {
            registrations: self.counters.registrations.load(Ordering::Relaxed),
            token_requests: self.counters.token_requests.load(Ordering::Relaxed),
            authenticated_requests: self.counters.authenticated_requests.load(Ordering::Relaxed),
            rejected_requests: self.counters.rejected_requests.load(Ordering::Relaxed),
            active_tokens: self.tokens.lock().values().filter(|t| now < t.expires_at).count(),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
