// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[test]
fn urlencoded_joins_pairs() -> anyhow::Result<()> {
    let body = urlencoded(&[("grant_type", "client_credentials"), ("scope", "all")]);
    assert_eq!(body, "grant_type=client_credentials&scope=all");
    Ok(())
}

#[test]
fn urlencoded_escapes_reserved_and_multibyte() -> anyhow::Result<()> {
    let body = urlencoded(&[("client_secret", "a b&c=d/é")]);
    assert_eq!(body, "client_secret=a%20b%26c%3Dd%2F%C3%A9");
    Ok(())
}

#[test]
fn set_header_replaces_case_insensitively() -> anyhow::Result<()> {
    let mut req = HttpRequest::get("/x").header("Authorization", "Bearer old");
    req.set_header("authorization", "Bearer new");
    assert_eq!(req.headers.len(), 1);
    assert_eq!(req.header_value("AUTHORIZATION"), Some("Bearer new"));
    Ok(())
}

#[test]
fn json_sets_content_type() -> anyhow::Result<()> {
    let req = HttpRequest::post("/items").json(&serde_json::json!({ "name": "a" }))?;
    assert_eq!(req.header_value("content-type"), Some("application/json"));
    assert_eq!(req.body.as_deref(), Some(&b"{\"name\":\"a\"}"[..]));
    Ok(())
}

#[test]
fn response_classification() -> anyhow::Result<()> {
    assert!(HttpResponse::new(204, "").is_success());
    assert!(!HttpResponse::new(401, "").is_success());
    assert!(HttpResponse::new(401, "").is_unauthorized());
    assert!(!HttpResponse::new(403, "").is_unauthorized());
    Ok(())
}

proptest! {
    #[test]
    fn urlencoded_output_is_unreserved_or_escaped(key in ".*", value in ".*") {
        let body = urlencoded(&[(&key, &value)]);
        let mut parts = body.splitn(2, '=');
        for part in [parts.next().unwrap_or(""), parts.next().unwrap_or("")] {
            let mut chars = part.chars();
            while let Some(c) = chars.next() {
                if c == '%' {
                    let hex: String = chars.by_ref().take(2).collect();
                    prop_assert_eq!(hex.len(), 2);
                    prop_assert!(hex.chars().all(|h| h.is_ascii_hexdigit()));
                } else {
                    prop_assert!(c.is_ascii_alphanumeric() || "-_.~".contains(c));
                }
            }
        }
    }
}
