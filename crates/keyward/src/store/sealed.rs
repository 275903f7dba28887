// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed store with AES-256-GCM sealed values and atomic writes.
//!
//! Layout inside the state directory:
//! - `store.key`: 32 random bytes, created on first open (mode 0600 on unix).
//! - `records.json`: `{"records": {"<key>": "<base64(nonce || ciphertext)>"}}`.
//!
//! The record key is bound as associated data, so a sealed value copied under
//! a different key fails to open.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use parking_lot::Mutex;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::SecureStore;

const KEY_FILE: &str = "store.key";
const RECORDS_FILE: &str = "records.json";
const KEY_LEN: usize = 32;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SealedRecords {
    #[serde(default)]
    records: BTreeMap<String, String>,
}

/// Encrypted JSON file store rooted at a state directory.
pub struct SealedFileStore {
    path: PathBuf,
    key: LessSafeKey,
    rng: SystemRandom,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl SealedFileStore {
    /// Open (or initialise) the store in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let rng = SystemRandom::new();
        let key_bytes = load_or_create_key(&dir.join(KEY_FILE), &rng)?;
        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| StoreError::Crypto("invalid key length".to_owned()))?;
        Ok(Self {
            path: dir.join(RECORDS_FILE),
            key: LessSafeKey::new(unbound),
            rng,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the records file. An unparseable file reads as empty, so the next
    /// write replaces it.
    fn load(&self) -> Result<SealedRecords, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(records) => Ok(records),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), err = %e, "discarding unreadable records file");
                    Ok(SealedRecords::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SealedRecords::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically (write tmp + rename).
    ///
    /// Uses a unique temp filename (PID + counter) so concurrent saves never
    /// share a `.tmp` file.
    fn save(&self, records: &SealedRecords) -> Result<(), StoreError> {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let json = serde_json::to_string_pretty(records)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn seal(&self, key: &str, plaintext: &[u8]) -> Result<String, StoreError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| StoreError::Crypto("nonce generation failed".to_owned()))?;
        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(key.as_bytes()),
                &mut in_out,
            )
            .map_err(|_| StoreError::Crypto("seal failed".to_owned()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);
        Ok(STANDARD.encode(blob))
    }

    fn open_sealed(&self, key: &str, encoded: &str) -> Result<Bytes, StoreError> {
        let corrupt = |reason: &str| StoreError::Corrupt { key: key.to_owned(), reason: reason.to_owned() };

        let blob = STANDARD.decode(encoded).map_err(|e| corrupt(&e.to_string()))?;
        if blob.len() < NONCE_LEN {
            return Err(corrupt("sealed value too short"));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| corrupt("invalid nonce"))?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(key.as_bytes()), &mut in_out)
            .map_err(|_| corrupt("authentication failed"))?;
        Ok(Bytes::copy_from_slice(plaintext))
    }
}

impl SecureStore for SealedFileStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let records = self.load()?;
        match records.records.get(key) {
            Some(encoded) => self.open_sealed(key, encoded).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let sealed = self.seal(key, &value)?;
        let mut records = self.load()?;
        records.records.insert(key.to_owned(), sealed);
        self.save(&records)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut records = self.load()?;
        if records.records.remove(key).is_none() {
            return Ok(());
        }
        self.save(&records)
    }
}

fn load_or_create_key(path: &Path, rng: &SystemRandom) -> Result<[u8; KEY_LEN], StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| StoreError::Corrupt {
            key: KEY_FILE.to_owned(),
            reason: format!("expected {KEY_LEN} bytes, found {}", bytes.len()),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut key = [0u8; KEY_LEN];
            rng.fill(&mut key).map_err(|_| StoreError::Crypto("key generation failed".to_owned()))?;
            write_private(path, &key)?;
            tracing::debug!(path = %path.display(), "created store key");
            Ok(key)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file =
        std::fs::OpenOptions::new().write(true).create_new(true).mode(0o600).open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
#[path = "sealed_tests.rs"]
mod tests;
