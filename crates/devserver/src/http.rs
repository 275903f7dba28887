// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the devserver.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Form, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{constant_time_eq, validate_api_key};
use crate::error::DevError;
use crate::state::{DevState, IssuedToken, StatsSnapshot};

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    #[serde(default)]
    pub grant_type: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identifier: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: usize,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "running".to_owned() })
}

/// `GET /apps/register`
pub async fn register(
    State(state): State<Arc<DevState>>,
    headers: HeaderMap,
) -> Result<Json<RegisterResponse>, DevError> {
    state.counters.registrations.fetch_add(1, Ordering::Relaxed);
    validate_api_key(&headers, &state.config.api_key)?;

    let (identifier, secret) = state.register();
    tracing::info!(%identifier, "registered application");
    Ok(Json(RegisterResponse { identifier, secret }))
}

/// `POST /apps/token`
pub async fn token(
    State(state): State<Arc<DevState>>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, DevError> {
    state.counters.token_requests.fetch_add(1, Ordering::Relaxed);

    if form.grant_type != "client_credentials" {
        return Err(DevError::UnsupportedGrantType);
    }
    if form.scope != "all" {
        return Err(DevError::InvalidScope);
    }
    let secret = state.secret_for(&form.client_id).ok_or(DevError::InvalidClient)?;
    if !constant_time_eq(&secret, &form.client_secret) {
        tracing::warn!(client_id = %form.client_id, "token request with wrong secret");
        return Err(DevError::InvalidClient);
    }

    let (access_token, issued) = state.issue_token(&form.client_id, Utc::now());
    tracing::info!(client_id = %form.client_id, expires_at = %issued.expires_at, "issued access token");
    Ok(Json(TokenResponse {
        access_token,
        expires_at: issued.expires_at,
        scope: "all".to_owned(),
        token_type: "Bearer".to_owned(),
    }))
}

/// `GET /api/v1/me` (bearer-protected)
pub async fn me(Extension(issued): Extension<IssuedToken>) -> Json<MeResponse> {
    Json(MeResponse { identifier: issued.identifier, expires_at: issued.expires_at })
}

/// `POST /dev/revoke`
pub async fn revoke(State(state): State<Arc<DevState>>) -> Json<RevokeResponse> {
    let revoked = state.revoke_all();
    tracing::info!(revoked, "revoked all access tokens");
    Json(RevokeResponse { revoked })
}

/// `GET /dev/stats`
pub async fn stats(State(state): State<Arc<DevState>>) -> Json<StatsSnapshot> {
    Json(state.stats())
}
