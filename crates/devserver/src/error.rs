// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error codes for the devserver API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevError {
    Unauthorized,
    InvalidApiKey,
    InvalidClient,
    UnsupportedGrantType,
    InvalidScope,
}

impl DevError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized | Self::InvalidClient => 401,
            Self::InvalidApiKey => 403,
            Self::UnsupportedGrantType | Self::InvalidScope => 400,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::InvalidClient => "INVALID_CLIENT",
            Self::UnsupportedGrantType => "UNSUPPORTED_GRANT_TYPE",
            Self::InvalidScope => "INVALID_SCOPE",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: self.to_error_body(message) }))
    }
}

impl fmt::Display for DevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for DevError {}

impl IntoResponse for DevError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Unauthorized => "missing, unknown or expired bearer token",
            Self::InvalidApiKey => "missing or invalid x-api-key header",
            Self::InvalidClient => "unknown client or wrong secret",
            Self::UnsupportedGrantType => "only client_credentials is supported",
            Self::InvalidScope => "only scope=all is supported",
        };
        self.to_http_response(message).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}
