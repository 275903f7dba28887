// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated API calls with a single retry on credential rejection.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::credential::coordinator::CredentialCoordinator;
use crate::error::ApiError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

const AUTHORIZATION: &str = "authorization";

/// Sends requests to the coordinator's environment with a bearer credential.
#[derive(Clone)]
pub struct ApiClient {
    coordinator: CredentialCoordinator,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(coordinator: CredentialCoordinator, transport: Arc<dyn Transport>) -> Self {
        Self { coordinator, transport }
    }

    pub fn coordinator(&self) -> &CredentialCoordinator {
        &self.coordinator
    }

    /// Send `request` with a valid credential attached.
    ///
    /// A 401 triggers one forced refresh and one re-send. Any other status is
    /// returned as-is; transport failures are not retried.
    pub async fn call(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let credential = self.coordinator.valid_credential(false).await?;
        let resp = self.send_with(request.clone(), &credential.authorization_value()).await?;
        if !resp.is_unauthorized() {
            return Ok(resp);
        }

        tracing::debug!(path = %request.path, "credential rejected, forcing refresh");
        let credential = self.coordinator.valid_credential(true).await?;
        let resp = self.send_with(request, &credential.authorization_value()).await?;
        if resp.is_unauthorized() {
            tracing::warn!(environment = %self.coordinator.environment(), "refreshed credential rejected");
            return Err(ApiError::CredentialRejected);
        }
        Ok(resp)
    }

    /// [`call`](Self::call), then require a 2xx status and decode the JSON body.
    pub async fn call_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let resp = self.call(request).await?;
        if !resp.is_success() {
            return Err(ApiError::Status { status: resp.status, body: resp.text() });
        }
        serde_json::from_slice(&resp.body).map_err(|e| ApiError::Decoding(e.to_string()))
    }

    async fn send_with(
        &self,
        mut request: HttpRequest,
        authorization: &str,
    ) -> Result<HttpResponse, ApiError> {
        request.set_header(AUTHORIZATION, authorization);
        let resp = self.transport.send(self.coordinator.base_url(), request).await?;
        tracing::debug!(status = resp.status, "api call completed");
        Ok(resp)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
