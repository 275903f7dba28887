// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration and client-credentials token requests.

use serde::de::DeserializeOwned;

use crate::credential::{AccessCredential, AppRegistration, Scope};
use crate::error::CallError;
use crate::transport::{urlencoded, HttpRequest, HttpResponse, Transport};

pub const REGISTER_PATH: &str = "/apps/register";
pub const TOKEN_PATH: &str = "/apps/token";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Register this installation and obtain its identifier/secret pair.
pub async fn register(
    transport: &dyn Transport,
    base_url: &str,
    api_key: &str,
) -> Result<AppRegistration, CallError> {
    let request = HttpRequest::get(REGISTER_PATH)
        .header(API_KEY_HEADER, api_key)
        .header("accept", "application/json");
    let resp = transport.send(base_url, request).await?;
    decode(resp)
}

/// Perform a single client-credentials grant.
pub async fn exchange_token(
    transport: &dyn Transport,
    base_url: &str,
    registration: &AppRegistration,
    scope: Scope,
) -> Result<AccessCredential, CallError> {
    let body = urlencoded(&[
        ("grant_type", "client_credentials"),
        ("client_id", registration.identifier.as_str()),
        ("client_secret", registration.secret.as_str()),
        ("scope", scope.as_str()),
    ]);
    let request = HttpRequest::post(TOKEN_PATH)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("accept", "application/json")
        .body(body);
    let resp = transport.send(base_url, request).await?;
    decode(resp)
}

fn decode<T: DeserializeOwned>(resp: HttpResponse) -> Result<T, CallError> {
    if !resp.is_success() {
        return Err(CallError::Status { status: resp.status, body: resp.text() });
    }
    serde_json::from_slice(&resp.body).map_err(|e| CallError::Decoding(e.to_string()))
}
