//! Where the scoring service lives and how long to wait for it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use bono_contracts::error::{BonoError, BonoResult};

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "BONO_API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> BonoResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| BonoError::Config {
            reason: format!("failed to parse client TOML: {e}"),
        })?;
        config.check()
    }

    pub fn from_file(path: &Path) -> BonoResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BonoError::Config {
            reason: format!("failed to read client config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `BONO_API_BASE_URL` when it is set and non-empty.
    pub fn with_env_override(self) -> Self {
        self.with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            debug!(base_url = %url, "overriding scoring service base URL");
            self.base_url = url;
        }
        self
    }

    /// Full URL for an endpoint path such as `/api/getRisk/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Reject values the client cannot work with.
    pub fn check(self) -> BonoResult<Self> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BonoError::Config {
                reason: format!("base_url must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(BonoError::Config {
                reason: "timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}
