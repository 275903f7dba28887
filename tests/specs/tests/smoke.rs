// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `keyward-devserver` binary and
//! drive the `keyward` CLI against it.

use std::time::Duration;

use keyward_specs::{DevServerProcess, KeywardCli};

const TIMEOUT: Duration = Duration::from_secs(10);

async fn start() -> anyhow::Result<(DevServerProcess, KeywardCli)> {
    let server = DevServerProcess::start(3600)?;
    server.wait_healthy(TIMEOUT).await?;
    let cli = KeywardCli::new(server.base_url())?;
    Ok((server, cli))
}

// -- token --------------------------------------------------------------------

#[tokio::test]
async fn token_is_cached_across_invocations() -> anyhow::Result<()> {
    let (server, cli) = start().await?;

    let first = cli.run(&["token"])?;
    anyhow::ensure!(first.success(), "token failed: {}", first.stderr);
    let first = first.json()?;
    assert_eq!(first["type"], "Bearer");
    assert_eq!(first["scope"], "all");

    let second = cli.run(&["token"])?.json()?;
    assert_eq!(second["access_token"], first["access_token"]);

    let stats = server.stats().await?;
    assert_eq!(stats["registrations"], 1);
    assert_eq!(stats["token_requests"], 1);
    Ok(())
}

#[tokio::test]
async fn forced_token_exchanges_again() -> anyhow::Result<()> {
    let (server, cli) = start().await?;

    let first = cli.run(&["token"])?.json()?;
    let forced = cli.run(&["token", "--force"])?.json()?;
    assert_ne!(forced["access_token"], first["access_token"]);

    let stats = server.stats().await?;
    assert_eq!(stats["registrations"], 1);
    assert_eq!(stats["token_requests"], 2);
    Ok(())
}

#[tokio::test]
async fn wrong_api_key_exits_non_zero() -> anyhow::Result<()> {
    let (_server, cli) = start().await?;
    let cli = cli.with_api_key("not-the-key");

    let out = cli.run(&["token"])?;
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("registration failed"), "stderr: {}", out.stderr);
    Ok(())
}

#[tokio::test]
async fn empty_api_key_is_a_usage_error() -> anyhow::Result<()> {
    let (_server, cli) = start().await?;
    let out = cli.with_api_key("").run(&["status"])?;
    assert_eq!(out.code, Some(2));
    Ok(())
}

// -- call ---------------------------------------------------------------------

#[tokio::test]
async fn call_reaches_protected_route() -> anyhow::Result<()> {
    let (_server, cli) = start().await?;

    let out = cli.run(&["call", "GET", "/api/v1/me"])?;
    anyhow::ensure!(out.success(), "call failed: {}", out.stderr);
    let me = out.json()?;
    assert!(me["identifier"].as_str().is_some_and(|id| id.starts_with("app_")));
    Ok(())
}

#[tokio::test]
async fn call_recovers_after_revocation() -> anyhow::Result<()> {
    let (server, cli) = start().await?;

    assert!(cli.run(&["call", "GET", "/api/v1/me"])?.success());
    server.revoke().await?;
    let out = cli.run(&["call", "GET", "/api/v1/me"])?;
    anyhow::ensure!(out.success(), "call after revoke failed: {}", out.stderr);

    let stats = server.stats().await?;
    assert_eq!(stats["token_requests"], 2);
    assert_eq!(stats["rejected_requests"], 1);
    Ok(())
}

#[tokio::test]
async fn call_reports_unexpected_status() -> anyhow::Result<()> {
    let (_server, cli) = start().await?;

    let out = cli.run(&["call", "GET", "/api/v1/missing"])?;
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("404"), "stderr: {}", out.stderr);
    Ok(())
}

// -- status / reset -----------------------------------------------------------

#[tokio::test]
async fn status_and_reset() -> anyhow::Result<()> {
    let (server, cli) = start().await?;

    let before = cli.run(&["status"])?;
    assert!(before.success());
    assert!(before.stdout.contains("REGISTERED   no"), "stdout: {}", before.stdout);

    assert!(cli.run(&["token"])?.success());
    let after = cli.run(&["status"])?;
    assert!(after.stdout.contains("REGISTERED   yes"), "stdout: {}", after.stdout);
    assert!(after.stdout.contains("CREDENTIAL   valid"), "stdout: {}", after.stdout);
    assert!(cli.state_dir().join("records.json").exists());

    let reset = cli.run(&["reset"])?;
    assert!(reset.success());
    assert!(cli.run(&["status"])?.stdout.contains("REGISTERED   no"));

    assert!(cli.run(&["token"])?.success());
    let stats = server.stats().await?;
    assert_eq!(stats["registrations"], 2);
    Ok(())
}
