// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};

use super::*;
use crate::credential::CredentialInfo;
use crate::environment::Environment;

#[yare::parameterized(
    none        = { None, "\u{2014}" },
    seconds     = { Some(42), "0m 42s" },
    minutes     = { Some(125), "2m 05s" },
    hours       = { Some(3_725), "1h 02m 05s" },
)]
fn formats_expiry(secs: Option<u64>, expected: &str) {
    assert_eq!(format_expires(secs), expected);
}

#[test]
fn status_table_without_credential() {
    let status = CredentialStatus {
        environment: Environment::Staging,
        base_url: "https://staging.api.keyward.dev".into(),
        registered: false,
        refreshing: false,
        credential: None,
    };
    let table = render_status(&status);
    assert!(table.contains("ENVIRONMENT  staging\n"));
    assert!(table.contains("REGISTERED   no\n"));
    assert!(table.contains("CREDENTIAL   none\n"));
    assert!(table.contains("STATE        idle\n"));
    assert_eq!(table.lines().count(), 7);
}

#[test]
fn status_table_with_valid_credential() -> anyhow::Result<()> {
    let expires_at = Utc
        .with_ymd_and_hms(2031, 1, 2, 3, 4, 5)
        .single()
        .ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let status = CredentialStatus {
        environment: Environment::Development,
        base_url: "http://127.0.0.1:9870".into(),
        registered: true,
        refreshing: true,
        credential: Some(CredentialInfo { expires_at, valid: true, expires_in_secs: Some(600) }),
    };
    let table = render_status(&status);
    assert!(table.contains("CREDENTIAL   valid\n"));
    assert!(table.contains("EXPIRES AT   2031-01-02T03:04:05+00:00\n"));
    assert!(table.contains("EXPIRES IN   10m 00s\n"));
    assert!(table.contains("STATE        refreshing\n"));
    Ok(())
}

#[test]
fn token_output_uses_snake_case() -> anyhow::Result<()> {
    let credential = AccessCredential {
        access_token: "tok".into(),
        expires_at: Utc
            .with_ymd_and_hms(2031, 1, 2, 3, 4, 5)
            .single()
            .ok_or_else(|| anyhow::anyhow!("bad date"))?,
        scope: Scope::All,
        token_type: TokenType::Bearer,
    };
    let json = serde_json::to_value(TokenOutput::from(&credential))?;
    assert_eq!(json["access_token"], "tok");
    assert_eq!(json["expires_at"], "2031-01-02T03:04:05+00:00");
    assert_eq!(json["type"], "Bearer");
    assert_eq!(json["scope"], "all");
    Ok(())
}
