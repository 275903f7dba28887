// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `keyward-devserver` binary as a subprocess and drives the
//! real `keyward` CLI against it.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

pub const API_KEY: &str = "smoke-api-key";

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to a compiled workspace binary.
pub fn binary(name: &str) -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join(name)
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A running `keyward-devserver` process that is killed on drop.
pub struct DevServerProcess {
    child: Child,
    port: u16,
}

impl DevServerProcess {
    /// Spawn the devserver on a free port with the given token lifetime.
    pub fn start(token_ttl_secs: u64) -> anyhow::Result<Self> {
        ensure_crypto();
        let binary = binary("keyward-devserver");
        anyhow::ensure!(binary.exists(), "devserver binary not found at {}", binary.display());

        let port = free_port()?;
        let child = Command::new(&binary)
            .args([
                "--host",
                "127.0.0.1",
                "--port",
                &port.to_string(),
                "--api-key",
                API_KEY,
                "--token-ttl-secs",
                &token_ttl_secs.to_string(),
                "--log-level",
                "warn",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Poll health until responsive.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("devserver did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Current `/dev/stats` counters.
    pub async fn stats(&self) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}/dev/stats", self.base_url());
        Ok(reqwest::get(url).await?.json().await?)
    }

    /// Revoke every token the server has issued.
    pub async fn revoke(&self) -> anyhow::Result<()> {
        let url = format!("{}/dev/revoke", self.base_url());
        reqwest::Client::new().post(url).send().await?.error_for_status()?;
        Ok(())
    }
}

impl Drop for DevServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Captured result of one `keyward` invocation.
#[derive(Debug)]
pub struct CliOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }
}

/// Runs the `keyward` CLI against one server with an isolated state dir.
pub struct KeywardCli {
    base_url: String,
    api_key: String,
    state_dir: tempfile::TempDir,
}

impl KeywardCli {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self { base_url: base_url.into(), api_key: API_KEY.to_owned(), state_dir: tempfile::tempdir()? })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn state_dir(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn run(&self, args: &[&str]) -> anyhow::Result<CliOutput> {
        let binary = binary("keyward");
        anyhow::ensure!(binary.exists(), "keyward binary not found at {}", binary.display());

        let output = Command::new(&binary)
            .args(args)
            .env("KEYWARD_BASE_URL", &self.base_url)
            .env("KEYWARD_API_KEY", &self.api_key)
            .env("KEYWARD_STATE_DIR", self.state_dir.path())
            .env("KEYWARD_ENV", "development")
            .env("KEYWARD_LOG_LEVEL", "warn")
            .env_remove("KEYWARD_SERVICE")
            .output()?;

        Ok(CliOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
