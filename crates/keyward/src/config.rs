// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::credential::coordinator::CoordinatorConfig;
use crate::environment::Environment;
use crate::store::{self, DEFAULT_SERVICE};
use crate::transport::Method;

/// Acquire, cache and use API credentials for the Keyward platform.
#[derive(Debug, Parser)]
#[command(name = "keyward", version, about)]
pub struct Config {
    /// Target environment (development, staging, production).
    #[arg(long, env = "KEYWARD_ENV", default_value = "development")]
    pub environment: String,

    /// Override the environment's default base URL.
    #[arg(long, env = "KEYWARD_BASE_URL")]
    pub base_url: Option<String>,

    /// API key used to register this installation.
    #[arg(long, env = "KEYWARD_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Namespace for persisted records.
    #[arg(long, env = "KEYWARD_SERVICE", default_value = DEFAULT_SERVICE)]
    pub service: String,

    /// Directory holding the sealed record store.
    #[arg(long, env = "KEYWARD_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "KEYWARD_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, env = "KEYWARD_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "KEYWARD_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print a valid access credential as JSON
    Token {
        /// Exchange a new credential even if the cached one is valid
        #[arg(long)]
        force: bool,
    },
    /// Send an authenticated request and print the response body
    Call {
        /// HTTP method (GET, POST, ...)
        method: String,
        /// Request path, relative to the base URL
        path: String,
        /// Query parameter, repeatable
        #[arg(long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
        /// Request header, repeatable
        #[arg(long = "header", value_name = "NAME=VALUE")]
        header: Vec<String>,
        /// Request body
        #[arg(long)]
        data: Option<String>,
    },
    /// Show cached registration and credential state
    Status,
    /// Clear stored registration and credential
    Reset,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("--api-key must not be empty");
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("--timeout-ms must be greater than zero");
        }
        if self.service.trim().is_empty() {
            anyhow::bail!("--service must not be empty");
        }
        self.environment_enum()?;
        if let Some(ref url) = self.base_url {
            validate_base_url(url)?;
        }

        if let Command::Call { ref method, ref path, ref query, ref header, .. } = self.command {
            parse_method(method)?;
            if !path.starts_with('/') {
                anyhow::bail!("request path must start with '/': {path}");
            }
            for pair in query.iter().chain(header) {
                parse_pair(pair)?;
            }
        }
        Ok(())
    }

    pub fn environment_enum(&self) -> anyhow::Result<Environment> {
        self.environment.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `--state-dir`, else the platform default.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(store::state_dir)
    }

    pub fn coordinator_config(&self) -> anyhow::Result<CoordinatorConfig> {
        let mut config = CoordinatorConfig::new(self.environment_enum()?, self.api_key.clone())
            .with_service(self.service.clone());
        if let Some(ref url) = self.base_url {
            config = config.with_base_url(url.trim_end_matches('/'));
        }
        Ok(config)
    }

    /// Build a minimal `Config` for tests.
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            environment: "development".into(),
            base_url: None,
            api_key: "test-api-key".into(),
            service: DEFAULT_SERVICE.into(),
            state_dir: None,
            timeout_ms: 1_000,
            log_format: "text".into(),
            log_level: "debug".into(),
            command: Command::Status,
        }
    }
}

fn validate_base_url(url: &str) -> anyhow::Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid --base-url {url}: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
        anyhow::bail!("--base-url must be an http(s) URL with a host: {url}");
    }
    Ok(())
}

pub fn parse_method(method: &str) -> anyhow::Result<Method> {
    Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid HTTP method: {method}"))
}

/// Split `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_pair(pair: &str) -> anyhow::Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => anyhow::bail!("expected KEY=VALUE, got: {pair}"),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
