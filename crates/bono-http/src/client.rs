//! `ScoringBackend` over HTTP.
//!
//! Each call is one blocking POST with a JSON body. A response is checked
//! in three stages before anything reaches the caller:
//!
//! 1. **Status**: non-2xx becomes `BonoError::Server`, carrying the
//!    service's `detail` text when the body has one.
//! 2. **Shape**: the JSON body is checked against a JSON Schema for the
//!    endpoint. Risk percentages outside 0..=100 fail here.
//! 3. **Decode**: the checked body is deserialized into the wire type.
//!
//! Nothing is retried.

use std::time::Duration;

use jsonschema::Validator;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use bono_contracts::{
    api::{
        ErrorBody, RiskRequest, RiskResponse, ShapPlot, ShapPlotRequest, ShapPlotResponse,
        ShapPlotsResponse, SitePlots, RISK_PATH, SHAP_PLOTS_PATH, SHAP_PLOT_PATH,
    },
    error::{BonoError, BonoResult},
};
use bono_core::traits::ScoringBackend;

use crate::config::ClientConfig;

// ── Response schemas ─────────────────────────────────────────────────────────

fn risk_schema() -> Value {
    let percentage = json!({ "type": "number", "minimum": 0, "maximum": 100 });
    json!({
        "type": "object",
        "required": ["risks"],
        "properties": {
            "message": { "type": ["string", "null"] },
            "risks": {
                "type": "object",
                "required": ["vertebral", "hip", "any"],
                "properties": {
                    "vertebral": percentage,
                    "hip": percentage,
                    "any": percentage
                }
            }
        }
    })
}

fn shap_plot_schema() -> Value {
    json!({
        "type": "object",
        "required": ["shap_plot"],
        "properties": {
            "message": { "type": ["string", "null"] },
            "shap_plot": { "type": "string", "minLength": 1 }
        }
    })
}

fn shap_plots_schema() -> Value {
    let plot = json!({ "type": "string", "minLength": 1 });
    json!({
        "type": "object",
        "required": ["shap_plots"],
        "properties": {
            "message": { "type": ["string", "null"] },
            "shap_plots": {
                "type": "object",
                "required": ["vertebral", "hip", "any"],
                "properties": { "vertebral": plot, "hip": plot, "any": plot }
            }
        }
    })
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Talks to the scoring service at `ClientConfig::base_url`.
pub struct HttpScoringClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
    risk_validator: Validator,
    shap_plot_validator: Validator,
    shap_plots_validator: Validator,
}

impl HttpScoringClient {
    pub fn new(config: ClientConfig) -> BonoResult<Self> {
        let config = config.check()?;
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BonoError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            risk_validator: compile(&risk_schema())?,
            shap_plot_validator: compile(&shap_plot_schema())?,
            shap_plots_validator: compile(&shap_plots_schema())?,
            config,
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn post<B, R>(&self, path: &str, body: &B, validator: &Validator) -> BonoResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");

        let response = self.http.post(&url).json(body).send().map_err(|e| {
            warn!(%url, error = %e, "request failed");
            BonoError::Transport {
                reason: format!("POST {url} failed: {e}"),
            }
        })?;

        let status = response.status();
        let text = response.text().map_err(|e| BonoError::Transport {
            reason: format!("failed to read response from {url}: {e}"),
        })?;

        if !status.is_success() {
            let detail = error_detail(&text, status.canonical_reason());
            warn!(%url, status = status.as_u16(), %detail, "scoring service returned an error");
            return Err(BonoError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: Value = serde_json::from_str(&text).map_err(|e| BonoError::Decode {
            reason: format!("response from {path} is not JSON: {e}"),
        })?;

        let violations: Vec<String> = validator
            .iter_errors(&payload)
            .map(|error| format!("{} at '{}'", error, error.instance_path))
            .collect();
        if !violations.is_empty() {
            warn!(%url, violations = violations.len(), "response failed schema check");
            return Err(BonoError::Decode {
                reason: format!("unexpected response from {path}: {}", violations.join("; ")),
            });
        }

        serde_json::from_value(payload).map_err(|e| BonoError::Decode {
            reason: format!("failed to decode response from {path}: {e}"),
        })
    }
}

impl ScoringBackend for HttpScoringClient {
    fn risk(&self, request: &RiskRequest) -> BonoResult<RiskResponse> {
        self.post(RISK_PATH, request, &self.risk_validator)
    }

    fn shap_plot(&self, request: &ShapPlotRequest) -> BonoResult<ShapPlot> {
        let response: ShapPlotResponse =
            self.post(SHAP_PLOT_PATH, request, &self.shap_plot_validator)?;
        Ok(response.shap_plot)
    }

    fn shap_plots(&self, request: &RiskRequest) -> BonoResult<SitePlots> {
        let response: ShapPlotsResponse =
            self.post(SHAP_PLOTS_PATH, request, &self.shap_plots_validator)?;
        Ok(response.shap_plots)
    }
}

fn compile(schema: &Value) -> BonoResult<Validator> {
    jsonschema::validator_for(schema).map_err(|e| BonoError::Config {
        reason: format!("invalid response schema: {e}"),
    })
}

/// Best human-readable reason from an error response body.
fn error_detail(body: &str, reason: Option<&str>) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: Value::String(s) }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => reason.unwrap_or("no detail").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_detail_string_used_verbatim() {
        assert_eq!(error_detail(r#"{"detail":"Model not loaded"}"#, None), "Model not loaded");
    }

    #[test]
    fn test_structured_detail_rendered_as_json() {
        let detail = error_detail(r#"{"detail":[{"loc":["body","age"]}]}"#, None);
        assert!(detail.contains("\"age\""));
    }

    #[test]
    fn test_plain_body_or_reason_fallback() {
        assert_eq!(error_detail("Bad Gateway\n", None), "Bad Gateway");
        assert_eq!(error_detail("", Some("Service Unavailable")), "Service Unavailable");
    }

    #[test]
    fn test_risk_schema_bounds_percentages() {
        let validator = compile(&risk_schema()).unwrap();
        assert!(validator.is_valid(&json!({ "risks": { "vertebral": 4.2, "hip": 0, "any": 100 } })));
        assert!(!validator.is_valid(&json!({ "risks": { "vertebral": 4.2, "hip": -1, "any": 9 } })));
        assert!(!validator.is_valid(&json!({ "risks": { "vertebral": 4.2, "hip": 1 } })));
        assert!(!validator.is_valid(&json!({ "message": "ok" })));
    }

    #[test]
    fn test_shap_schemas_require_plots() {
        assert!(!compile(&shap_plot_schema()).unwrap().is_valid(&json!({ "shap_plot": "" })));
        let batch = compile(&shap_plots_schema()).unwrap();
        assert!(batch.is_valid(&json!({ "shap_plots": { "vertebral": "a", "hip": "b", "any": "c" } })));
        assert!(!batch.is_valid(&json!({ "shap_plots": { "vertebral": "a" } })));
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = ClientConfig {
            base_url: "localhost".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(HttpScoringClient::new(config), Err(BonoError::Config { .. })));
    }
}
