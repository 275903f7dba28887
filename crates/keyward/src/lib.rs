// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod client;
pub mod command;
pub mod config;
pub mod credential;
pub mod environment;
pub mod error;
pub mod store;
pub mod test_support;
pub mod transport;

pub use client::ApiClient;
pub use credential::coordinator::{CoordinatorConfig, CredentialCoordinator};
pub use credential::{AccessCredential, AppRegistration, CredentialEvent};
pub use environment::Environment;
pub use error::{ApiError, CallError, CredentialError, StoreError, TransportError};
pub use store::{MemoryStore, SealedFileStore, SecureStore};
pub use transport::{HttpRequest, HttpResponse, Transport};
