//! The `--config` document: one TOML file with an `[api]` section for the
//! scoring service and a `[thresholds]` section for risk bucketing.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//!
//! [thresholds.sites.hip]
//! low_below = 3.0
//! high_above = 7.0
//! ```

use std::path::Path;

use serde::Deserialize;

use bono_contracts::error::{BonoError, BonoResult};
use bono_http::ClientConfig;
use bono_thresholds::{ThresholdConfig, ThresholdEngine};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ClientConfig,
    pub thresholds: ThresholdConfig,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> BonoResult<Self> {
        toml::from_str(s).map_err(|e| BonoError::Config {
            reason: format!("failed to parse config TOML: {e}"),
        })
    }

    pub fn from_file(path: &Path) -> BonoResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BonoError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Client config after the environment and then `api_url` are applied.
    pub fn client_config(&self, api_url: Option<String>) -> BonoResult<ClientConfig> {
        self.api
            .clone()
            .with_env_override()
            .with_base_url_override(api_url)
            .check()
    }

    pub fn threshold_engine(&self) -> BonoResult<ThresholdEngine> {
        ThresholdEngine::new(self.thresholds.clone())
    }
}
