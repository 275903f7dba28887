// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent key/value storage for the registration and access credential.
//!
//! The coordinator only needs get/set/clear with last-write-wins semantics.
//! [`SealedFileStore`] encrypts values at rest; [`MemoryStore`] keeps them in
//! process memory.

pub mod sealed;

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::StoreError;

pub use sealed::SealedFileStore;

/// Default service namespace for record keys.
pub const DEFAULT_SERVICE: &str = "dev.keyward";

/// Opaque secure key/value store.
pub trait SecureStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;
    fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError>;
    /// Remove a record. Clearing a missing key is not an error.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// The two record keys used by one coordinator, scoped to a service namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    pub registration: String,
    pub credential: String,
}

impl RecordKeys {
    pub fn for_service(service: &str) -> Self {
        Self {
            registration: format!("{service}/app-registration"),
            credential: format!("{service}/access-credential"),
        }
    }
}

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl SecureStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.records.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.records.lock().remove(key);
        Ok(())
    }
}

/// Resolve the state directory for persisted records.
///
/// Checks `KEYWARD_STATE_DIR`, then `$XDG_STATE_HOME/keyward`,
/// then `$HOME/.local/state/keyward`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KEYWARD_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("keyward");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/keyward");
    }
    PathBuf::from(".keyward")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
