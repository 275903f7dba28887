// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands: `token`, `call`, `status`, `reset`.

use std::sync::Arc;

use serde::Serialize;

use crate::client::ApiClient;
use crate::config::{parse_method, parse_pair, Command, Config};
use crate::credential::coordinator::CredentialCoordinator;
use crate::credential::{AccessCredential, CredentialStatus, Scope, TokenType};
use crate::store::{SealedFileStore, SecureStore};
use crate::transport::http::HttpTransport;
use crate::transport::{HttpRequest, Transport};

/// `token` output. Snake-case to match the rest of the CLI's JSON.
#[derive(Debug, Serialize)]
struct TokenOutput<'a> {
    access_token: &'a str,
    expires_at: String,
    #[serde(rename = "type")]
    token_type: TokenType,
    scope: Scope,
}

impl<'a> From<&'a AccessCredential> for TokenOutput<'a> {
    fn from(credential: &'a AccessCredential) -> Self {
        Self {
            access_token: &credential.access_token,
            expires_at: credential.expires_at.to_rfc3339(),
            token_type: credential.token_type,
            scope: credential.scope,
        }
    }
}

/// Run the selected subcommand. Returns a process exit code.
pub async fn run(config: Config) -> anyhow::Result<i32> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.timeout()));
    let state_dir = config.state_dir();
    let store: Arc<dyn SecureStore> = Arc::new(SealedFileStore::open(&state_dir)?);
    tracing::debug!(state_dir = %state_dir.display(), "opened record store");

    let coordinator =
        CredentialCoordinator::new(config.coordinator_config()?, Arc::clone(&transport), store);

    match config.command {
        Command::Token { force } => token(&coordinator, force).await,
        Command::Call { method, path, query, header, data } => {
            let mut request = HttpRequest::new(parse_method(&method)?, path);
            for pair in &query {
                let (k, v) = parse_pair(pair)?;
                request = request.query(k, v);
            }
            for pair in &header {
                let (k, v) = parse_pair(pair)?;
                request = request.header(k, v);
            }
            if let Some(data) = data {
                request = request.body(data);
            }
            call(&ApiClient::new(coordinator, transport), request).await
        }
        Command::Status => {
            print!("{}", render_status(&coordinator.status()));
            Ok(0)
        }
        Command::Reset => {
            coordinator.reset()?;
            println!("Cleared stored credentials for {}.", coordinator.environment());
            Ok(0)
        }
    }
}

async fn token(coordinator: &CredentialCoordinator, force: bool) -> anyhow::Result<i32> {
    match coordinator.valid_credential(force).await {
        Ok(credential) => {
            println!("{}", serde_json::to_string_pretty(&TokenOutput::from(&credential))?);
            Ok(0)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(1)
        }
    }
}

async fn call(client: &ApiClient, request: HttpRequest) -> anyhow::Result<i32> {
    match client.call(request).await {
        Ok(resp) if resp.is_success() => {
            println!("{}", resp.text());
            Ok(0)
        }
        Ok(resp) => {
            eprintln!("error ({}): {}", resp.status, resp.text());
            Ok(1)
        }
        Err(e) => {
            eprintln!("error [{}]: {e}", e.code());
            Ok(1)
        }
    }
}

fn format_expires(secs: Option<u64>) -> String {
    match secs {
        Some(s) => {
            let h = s / 3600;
            let m = (s % 3600) / 60;
            let rem = s % 60;
            if h > 0 {
                format!("{h}h {m:02}m {rem:02}s")
            } else {
                format!("{m}m {rem:02}s")
            }
        }
        None => "\u{2014}".to_string(),
    }
}

/// Key/value table for `keyward status`.
pub(crate) fn render_status(status: &CredentialStatus) -> String {
    let credential = match &status.credential {
        Some(info) if info.valid => "valid",
        Some(_) => "expired",
        None => "none",
    };
    let expires_at = status
        .credential
        .as_ref()
        .map(|info| info.expires_at.to_rfc3339())
        .unwrap_or_else(|| "\u{2014}".to_string());
    let expires_in =
        format_expires(status.credential.as_ref().and_then(|info| info.expires_in_secs));

    let rows = [
        ("ENVIRONMENT", status.environment.to_string()),
        ("BASE URL", status.base_url.clone()),
        ("REGISTERED", if status.registered { "yes" } else { "no" }.to_string()),
        ("CREDENTIAL", credential.to_string()),
        ("EXPIRES AT", expires_at),
        ("EXPIRES IN", expires_in),
        ("STATE", if status.refreshing { "refreshing" } else { "idle" }.to_string()),
    ];
    let key_w = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (key, value) in rows {
        out.push_str(&format!("{key:<key_w$}  {value}\n"));
    }
    out
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
