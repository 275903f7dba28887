// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for credential acquisition and authenticated calls.

use thiserror::Error;

/// Broad category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    InvalidRequest,
    Other,
}

/// A request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Underlying cause of a failed registration or token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decoding: {0}")]
    Decoding(String),
}

/// Failure to produce a valid access credential.
///
/// `Clone` so that a single in-flight result can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("registration failed: {0}")]
    RegistrationFailed(#[source] CallError),
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(#[source] CallError),
    /// The refresh task ended without producing a result.
    #[error("credential refresh interrupted: {0}")]
    Interrupted(String),
}

/// Failure of one authenticated API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No credential could be obtained.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// The server rejected a freshly refreshed credential.
    #[error("credential rejected after forced refresh")]
    CredentialRejected,
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decoding: {0}")]
    Decoding(String),
}

impl ApiError {
    /// True when the call failed because the client could not authenticate,
    /// as opposed to the request itself failing.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Credential(_) | Self::CredentialRejected)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Credential(CredentialError::RegistrationFailed(_)) => "REGISTRATION_FAILED",
            Self::Credential(CredentialError::TokenExchangeFailed(_)) => "TOKEN_EXCHANGE_FAILED",
            Self::Credential(CredentialError::Interrupted(_)) => "REFRESH_INTERRUPTED",
            Self::CredentialRejected => "CREDENTIAL_REJECTED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Status { .. } => "UNEXPECTED_STATUS",
            Self::Decoding(_) => "DECODING_ERROR",
        }
    }
}

/// Failure inside a [`SecureStore`](crate::store::SecureStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("corrupt store record {key}: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("store crypto failure: {0}")]
    Crypto(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
