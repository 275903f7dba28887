// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn set_then_get_returns_value() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SealedFileStore::open(dir.path())?;
    store.set("svc/access-credential", Bytes::from_static(b"{\"token\":1}"))?;
    assert_eq!(
        store.get("svc/access-credential")?,
        Some(Bytes::from_static(b"{\"token\":1}"))
    );
    assert!(store.get("svc/app-registration")?.is_none());
    Ok(())
}

#[test]
fn values_are_not_stored_in_plaintext() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SealedFileStore::open(dir.path())?;
    store.set("k", Bytes::from_static(b"super-secret-value"))?;
    let raw = std::fs::read_to_string(store.path())?;
    assert!(!raw.contains("super-secret-value"));
    assert!(raw.contains("\"k\""));
    Ok(())
}

#[test]
fn reopen_reads_previous_records() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    {
        let store = SealedFileStore::open(dir.path())?;
        store.set("k", Bytes::from_static(b"persisted"))?;
    }
    let store = SealedFileStore::open(dir.path())?;
    assert_eq!(store.get("k")?, Some(Bytes::from_static(b"persisted")));
    Ok(())
}

#[test]
fn value_moved_to_other_key_fails_to_open() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SealedFileStore::open(dir.path())?;
    store.set("a", Bytes::from_static(b"value"))?;

    let raw = std::fs::read_to_string(store.path())?;
    let mut records: serde_json::Value = serde_json::from_str(&raw)?;
    let sealed = records["records"]["a"].clone();
    records["records"]["b"] = sealed;
    std::fs::write(store.path(), serde_json::to_string(&records)?)?;

    assert!(matches!(store.get("b"), Err(StoreError::Corrupt { .. })));
    assert!(store.get("a")?.is_some());
    Ok(())
}

#[test]
fn tampered_value_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SealedFileStore::open(dir.path())?;
    store.set("k", Bytes::from_static(b"value"))?;

    let raw = std::fs::read_to_string(store.path())?;
    let mut records: serde_json::Value = serde_json::from_str(&raw)?;
    let encoded = records["records"]["k"].as_str().unwrap_or_default().to_owned();
    let mut blob = STANDARD.decode(encoded)?;
    if let Some(last) = blob.last_mut() {
        *last ^= 0x01;
    }
    records["records"]["k"] = serde_json::Value::String(STANDARD.encode(blob));
    std::fs::write(store.path(), serde_json::to_string(&records)?)?;

    assert!(matches!(store.get("k"), Err(StoreError::Corrupt { .. })));
    Ok(())
}

#[test]
fn clear_removes_only_named_key() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SealedFileStore::open(dir.path())?;
    store.set("a", Bytes::from_static(b"1"))?;
    store.set("b", Bytes::from_static(b"2"))?;
    store.clear("a")?;
    store.clear("a")?;
    assert!(store.get("a")?.is_none());
    assert_eq!(store.get("b")?, Some(Bytes::from_static(b"2")));
    Ok(())
}

#[test]
fn unreadable_records_file_is_replaced_on_write() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SealedFileStore::open(dir.path())?;
    store.set("a", Bytes::from_static(b"lost"))?;
    std::fs::write(store.path(), "{not json")?;

    assert!(store.get("a")?.is_none());
    store.clear("a")?;
    store.set("b", Bytes::from_static(b"kept"))?;
    assert_eq!(store.get("b")?, Some(Bytes::from_static(b"kept")));

    let raw = std::fs::read_to_string(store.path())?;
    let records: serde_json::Value = serde_json::from_str(&raw)?;
    assert!(records["records"]["a"].is_null());
    Ok(())
}

#[test]
fn truncated_key_file_is_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("store.key"), b"short")?;
    assert!(matches!(SealedFileStore::open(dir.path()), Err(StoreError::Corrupt { .. })));
    Ok(())
}

#[cfg(unix)]
#[test]
fn key_file_is_private() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    let _store = SealedFileStore::open(dir.path())?;
    let mode = std::fs::metadata(dir.path().join("store.key"))?.permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    Ok(())
}
