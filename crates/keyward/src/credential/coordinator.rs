// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential coordinator: registration, token exchange, caching and
//! single-flight refresh.
//!
//! At most one fetch sequence (registration-if-needed + token exchange) runs
//! at a time. Callers that arrive while it is in flight attach to the same
//! [`Shared`] handle and observe exactly its result. The fetch itself runs on
//! a spawned task, so a caller that stops waiting does not cancel it.
//!
//! Known race: [`CredentialCoordinator::reset`] does not cancel an in-flight
//! fetch. If that fetch completes after the reset, it repopulates both the
//! cache and the store.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::credential::exchange;
use crate::credential::{
    AccessCredential, AppRegistration, CredentialEvent, CredentialInfo, CredentialStatus, Scope,
};
use crate::environment::Environment;
use crate::error::{CredentialError, StoreError};
use crate::store::{RecordKeys, SecureStore, DEFAULT_SERVICE};
use crate::transport::Transport;

type FetchResult = Result<AccessCredential, CredentialError>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// Settings for one coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub environment: Environment,
    pub base_url: String,
    pub api_key: String,
    /// Namespace for the persisted record keys.
    pub service: String,
}

impl CoordinatorConfig {
    pub fn new(environment: Environment, api_key: impl Into<String>) -> Self {
        Self {
            environment,
            base_url: environment.default_base_url().to_owned(),
            api_key: api_key.into(),
            service: DEFAULT_SERVICE.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

#[derive(Default)]
struct CacheState {
    registration: Option<AppRegistration>,
    credential: Option<AccessCredential>,
    /// Generation and handle of the fetch currently in flight.
    in_flight: Option<(u64, InFlight)>,
    generation: u64,
}

struct Inner {
    config: CoordinatorConfig,
    keys: RecordKeys,
    scope: Scope,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SecureStore>,
    state: Mutex<CacheState>,
    event_tx: broadcast::Sender<CredentialEvent>,
}

/// Produces valid access credentials for one environment.
///
/// Cheap to clone; clones share cache, in-flight state and event channel.
#[derive(Clone)]
pub struct CredentialCoordinator {
    inner: Arc<Inner>,
}

impl CredentialCoordinator {
    /// Create a coordinator, seeding its cache from `store`.
    ///
    /// Records that fail to load or decode are treated as absent.
    pub fn new(
        config: CoordinatorConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        let keys = RecordKeys::for_service(&config.service);
        let registration = load_record::<AppRegistration>(store.as_ref(), &keys.registration);
        let credential = load_record::<AccessCredential>(store.as_ref(), &keys.credential);
        tracing::debug!(
            environment = %config.environment,
            registered = registration.is_some(),
            cached_credential = credential.is_some(),
            "credential coordinator initialised"
        );

        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                config,
                keys,
                scope: Scope::All,
                transport,
                store,
                state: Mutex::new(CacheState { registration, credential, ..Default::default() }),
                event_tx,
            }),
        }
    }

    pub fn environment(&self) -> Environment {
        self.inner.config.environment
    }

    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// Subscribe to refresh/reset events.
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Return a valid credential, fetching one if needed.
    ///
    /// - A fetch already in flight is joined, whatever `force_refresh` says.
    /// - Otherwise a cached, unexpired credential is returned without network
    ///   access unless `force_refresh` is set.
    /// - Otherwise a new fetch starts and this caller waits on it.
    ///
    /// The coordinator never retries a failed fetch itself.
    pub async fn valid_credential(&self, force_refresh: bool) -> FetchResult {
        let (generation, in_flight) = {
            let mut state = self.inner.state.lock();
            match state.in_flight.clone() {
                Some((generation, handle)) => {
                    tracing::debug!(generation, "joining in-flight credential refresh");
                    (generation, handle)
                }
                None => {
                    if !force_refresh {
                        if let Some(credential) = state.credential.as_ref().filter(|c| c.is_valid())
                        {
                            return Ok(credential.clone());
                        }
                    }
                    state.generation += 1;
                    let generation = state.generation;
                    let handle = self.start_refresh(generation);
                    state.in_flight = Some((generation, handle.clone()));
                    (generation, handle)
                }
            }
        };

        let result = in_flight.await;
        if matches!(result, Err(CredentialError::Interrupted(_))) {
            self.inner.clear_in_flight(generation);
        }
        result
    }

    /// Clear cached and persisted registration and credential. Idempotent.
    ///
    /// Does not cancel a fetch already in flight.
    pub fn reset(&self) -> Result<(), StoreError> {
        {
            let mut state = self.inner.state.lock();
            state.registration = None;
            state.credential = None;
        }
        // Attempt both clears; report the first failure.
        let registration = self.inner.store.clear(&self.inner.keys.registration);
        let credential = self.inner.store.clear(&self.inner.keys.credential);
        let _ = self.inner.event_tx.send(CredentialEvent::Reset);
        tracing::info!(environment = %self.environment(), "credentials reset");
        registration.and(credential)
    }

    /// Snapshot of cached state, without secrets.
    pub fn status(&self) -> CredentialStatus {
        let now = Utc::now();
        let state = self.inner.state.lock();
        CredentialStatus {
            environment: self.inner.config.environment,
            base_url: self.inner.config.base_url.clone(),
            registered: state.registration.is_some(),
            refreshing: state.in_flight.is_some(),
            credential: state.credential.as_ref().map(|c| CredentialInfo {
                expires_at: c.expires_at,
                valid: c.is_valid_at(now),
                expires_in_secs: c.expires_in_secs(now),
            }),
        }
    }

    /// Spawn the fetch task and wrap its handle for sharing.
    ///
    /// Must be called with the state lock held so the handle is installed
    /// before the task can complete.
    fn start_refresh(&self, generation: u64) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run_refresh(generation).await });
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(CredentialError::Interrupted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    async fn run_refresh(&self, generation: u64) -> FetchResult {
        tracing::debug!(generation, environment = %self.config.environment, "credential refresh started");
        let result = self.fetch().await;

        {
            let mut state = self.state.lock();
            if let Ok(ref credential) = result {
                state.credential = Some(credential.clone());
            }
            if matches!(state.in_flight, Some((g, _)) if g == generation) {
                state.in_flight = None;
            }
        }

        match &result {
            Ok(credential) => {
                tracing::info!(
                    environment = %self.config.environment,
                    expires_at = %credential.expires_at,
                    "credential refreshed"
                );
                let _ = self
                    .event_tx
                    .send(CredentialEvent::Refreshed { expires_at: credential.expires_at });
            }
            Err(e) => {
                tracing::warn!(environment = %self.config.environment, err = %e, "credential refresh failed");
                let _ = self.event_tx.send(CredentialEvent::RefreshFailed { error: e.to_string() });
            }
        }
        result
    }

    async fn fetch(&self) -> FetchResult {
        let registration = self.registration().await?;
        let credential = exchange::exchange_token(
            self.transport.as_ref(),
            &self.config.base_url,
            &registration,
            self.scope,
        )
        .await
        .map_err(CredentialError::TokenExchangeFailed)?;
        self.persist(&self.keys.credential, &credential);
        Ok(credential)
    }

    /// Cached registration, else the stored one, else a fresh registration.
    async fn registration(&self) -> Result<AppRegistration, CredentialError> {
        let cached = self.state.lock().registration.clone();
        if let Some(registration) = cached {
            return Ok(registration);
        }

        if let Some(registration) =
            load_record::<AppRegistration>(self.store.as_ref(), &self.keys.registration)
        {
            self.state.lock().registration = Some(registration.clone());
            return Ok(registration);
        }

        tracing::info!(environment = %self.config.environment, "registering application");
        let registration =
            exchange::register(self.transport.as_ref(), &self.config.base_url, &self.config.api_key)
                .await
                .map_err(CredentialError::RegistrationFailed)?;
        self.persist(&self.keys.registration, &registration);
        self.state.lock().registration = Some(registration.clone());
        Ok(registration)
    }

    fn clear_in_flight(&self, generation: u64) {
        let mut state = self.state.lock();
        if matches!(state.in_flight, Some((g, _)) if g == generation) {
            state.in_flight = None;
        }
    }

    /// Write a record. Failures are logged and do not fail the fetch.
    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_vec(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, err = %e, "failed to encode credential record");
                return;
            }
        };
        if let Err(e) = self.store.set(key, Bytes::from(encoded)) {
            tracing::warn!(key, err = %e, "failed to persist credential record");
        }
    }
}

fn load_record<T: DeserializeOwned>(store: &dyn SecureStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, err = %e, "failed to read credential record");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, err = %e, "ignoring undecodable credential record");
            None
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
