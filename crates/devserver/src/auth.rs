// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::error::DevError;
use crate::state::{DevState, IssuedToken};

/// Constant-time string comparison to prevent timing side-channel attacks.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Validate the `x-api-key` header used by `/apps/register`.
pub fn validate_api_key(headers: &HeaderMap, expected: &str) -> Result<(), DevError> {
    let key =
        headers.get("x-api-key").and_then(|v| v.to_str().ok()).ok_or(DevError::InvalidApiKey)?;
    if constant_time_eq(key, expected) {
        Ok(())
    } else {
        Err(DevError::InvalidApiKey)
    }
}

/// Extract the token from an `authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, DevError> {
    let header =
        headers.get("authorization").and_then(|v| v.to_str().ok()).ok_or(DevError::Unauthorized)?;
    header.strip_prefix("Bearer ").ok_or(DevError::Unauthorized)
}

/// Axum middleware for protected API routes.
///
/// Accepts only tokens issued by this server that have not expired or been
/// revoked. The matching [`IssuedToken`] is inserted as a request extension.
pub async fn auth_layer(
    State(state): State<Arc<DevState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let issued: Result<IssuedToken, DevError> = bearer_token(req.headers())
        .and_then(|token| state.active_token(token, Utc::now()).ok_or(DevError::Unauthorized));

    match issued {
        Ok(issued) => {
            state.counters.authenticated_requests.fetch_add(1, Ordering::Relaxed);
            req.extensions_mut().insert(issued);
            next.run(req).await
        }
        Err(code) => {
            state.counters.rejected_requests.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %req.uri().path(), "rejected bearer token");
            code.into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
