// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-process API used by coordinator and client tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use crate::credential::coordinator::{CoordinatorConfig, CredentialCoordinator};
use crate::credential::exchange::{REGISTER_PATH, TOKEN_PATH};
use crate::environment::Environment;
use crate::error::{TransportError, TransportErrorKind};
use crate::store::MemoryStore;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportFuture};

pub const FAKE_BASE_URL: &str = "http://fake.test";
pub const FAKE_API_KEY: &str = "test-api-key";

/// A fake registration/token server plus scripted resource responses.
///
/// Tokens are issued as `token-1`, `token-2`, ... in exchange order.
pub struct FakeApi {
    delay: Mutex<Duration>,
    token_ttl: Mutex<chrono::Duration>,
    pub fail_registration: AtomicBool,
    pub fail_token: AtomicBool,
    pub fail_resource_transport: AtomicBool,
    resource_statuses: Mutex<VecDeque<u16>>,
    requests: Mutex<Vec<(String, HttpRequest)>>,
    issued: AtomicUsize,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            delay: Mutex::new(Duration::ZERO),
            token_ttl: Mutex::new(chrono::Duration::hours(1)),
            fail_registration: AtomicBool::new(false),
            fail_token: AtomicBool::new(false),
            fail_resource_transport: AtomicBool::new(false),
            resource_statuses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            issued: AtomicUsize::new(0),
        }
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delay every response, widening the window for concurrent callers.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Lifetime of subsequently issued tokens. Negative values issue
    /// already-expired tokens.
    pub fn set_token_ttl(&self, ttl: chrono::Duration) {
        *self.token_ttl.lock() = ttl;
    }

    /// Queue statuses for non-auth paths. Unscripted calls return 200.
    pub fn script_resource(&self, statuses: &[u16]) {
        self.resource_statuses.lock().extend(statuses.iter().copied());
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|(_, r)| r.path == path).count()
    }

    pub fn registrations(&self) -> usize {
        self.count(REGISTER_PATH)
    }

    pub fn exchanges(&self) -> usize {
        self.count(TOKEN_PATH)
    }

    pub fn total(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests (with their base URL) sent to `path`, oldest first.
    pub fn requests_to(&self, path: &str) -> Vec<(String, HttpRequest)> {
        self.requests.lock().iter().filter(|(_, r)| r.path == path).cloned().collect()
    }

    pub fn base_urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(b, _)| b.clone()).collect()
    }

    fn handle(&self, base_url: &str, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request.path.clone();
        self.requests.lock().push((base_url.to_owned(), request));

        match path.as_str() {
            REGISTER_PATH => {
                if self.fail_registration.load(Ordering::SeqCst) {
                    return Ok(HttpResponse::new(503, "registration unavailable"));
                }
                let body = serde_json::json!({ "identifier": "app-1", "secret": "s3cret" });
                Ok(HttpResponse::new(200, body.to_string()))
            }
            TOKEN_PATH => {
                if self.fail_token.load(Ordering::SeqCst) {
                    return Ok(HttpResponse::new(500, "token endpoint down"));
                }
                let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                let expires_at = Utc::now() + *self.token_ttl.lock();
                let body = serde_json::json!({
                    "accessToken": format!("token-{n}"),
                    "expiresAt": expires_at.to_rfc3339(),
                    "scope": "all",
                    "type": "Bearer",
                });
                Ok(HttpResponse::new(200, body.to_string()))
            }
            _ => {
                if self.fail_resource_transport.load(Ordering::SeqCst) {
                    return Err(TransportError::new(TransportErrorKind::Connect, "connection reset"));
                }
                let status = self.resource_statuses.lock().pop_front().unwrap_or(200);
                Ok(HttpResponse::new(status, format!("{{\"status\":{status}}}")))
            }
        }
    }
}

impl Transport for FakeApi {
    fn send<'a>(&'a self, base_url: &'a str, request: HttpRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            let delay = *self.delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.handle(base_url, request)
        })
    }
}

pub fn fake_config() -> CoordinatorConfig {
    CoordinatorConfig::new(Environment::Development, FAKE_API_KEY).with_base_url(FAKE_BASE_URL)
}

/// Coordinator wired to `api` and a fresh in-memory store.
pub fn fake_coordinator(api: &Arc<FakeApi>) -> (CredentialCoordinator, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let coordinator = CredentialCoordinator::new(fake_config(), api.clone(), store.clone());
    (coordinator, store)
}
