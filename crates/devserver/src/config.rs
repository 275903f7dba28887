// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the local registration/token server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "keyward-devserver", version, about)]
pub struct DevConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "KEYWARD_DEV_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9870, env = "KEYWARD_DEV_PORT")]
    pub port: u16,

    /// API key clients must present when registering.
    #[arg(long, default_value = "dev-api-key", env = "KEYWARD_DEV_API_KEY")]
    pub api_key: String,

    /// Lifetime of issued access tokens in seconds.
    #[arg(long, default_value_t = 3600, env = "KEYWARD_DEV_TOKEN_TTL_SECS")]
    pub token_ttl_secs: u64,

    /// Log format (json or text).
    #[arg(long, env = "KEYWARD_DEV_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "KEYWARD_DEV_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl DevConfig {
    /// Loopback config on an ephemeral port, for tests.
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            api_key: "dev-api-key".into(),
            token_ttl_secs: 3600,
            log_format: "text".into(),
            log_level: "debug".into(),
        }
    }
}
