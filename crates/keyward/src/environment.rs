// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Deployment the coordinator authenticates against.
///
/// Registration, token exchange and authenticated calls for one coordinator
/// always target the same environment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Base URL used when no explicit override is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Development => "http://127.0.0.1:9870",
            Self::Staging => "https://staging.api.keyward.dev",
            Self::Production => "https://api.keyward.dev",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!("invalid environment: {other}"),
        }
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
