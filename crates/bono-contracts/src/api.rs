//! Request and response bodies exchanged with the scoring service.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::{
    error::{BonoError, BonoResult},
    patient::PatientRecord,
    risk::{FractureSite, RiskHorizon, SiteRisks},
};

/// Path of the risk endpoint, relative to the service base URL.
pub const RISK_PATH: &str = "/api/getRisk/";
/// Path of the single-site explanation endpoint.
pub const SHAP_PLOT_PATH: &str = "/api/getShapPlot/";
/// Path of the all-sites explanation endpoint.
pub const SHAP_PLOTS_PATH: &str = "/api/getShapPlots/";

/// Body of `POST /api/getRisk/` and `POST /api/getShapPlots/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRequest {
    pub risk_horizon: RiskHorizon,
    pub patient_data: PatientRecord,
}

/// Body of `POST /api/getShapPlot/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapPlotRequest {
    pub risk_horizon: RiskHorizon,
    pub patient_data: PatientRecord,
    pub fx_type: FractureSite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub risks: SiteRisks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapPlotResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub shap_plot: ShapPlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapPlotsResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub shap_plots: SitePlots,
}

/// Error body the scoring service sends with 4xx/5xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

/// A SHAP waterfall plot as a base64-encoded PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapPlot(pub String);

impl ShapPlot {
    /// Decode the image bytes. Accepts a bare base64 string or a
    /// `data:image/png;base64,` URL.
    pub fn decode(&self) -> BonoResult<Vec<u8>> {
        let encoded = match self.0.split_once(";base64,") {
            Some((_, data)) => data,
            None => self.0.as_str(),
        };
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| BonoError::Decode {
                reason: format!("SHAP plot is not valid base64: {e}"),
            })
    }
}

/// One explanation plot per site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePlots {
    pub vertebral: ShapPlot,
    pub hip: ShapPlot,
    pub any: ShapPlot,
}

impl SitePlots {
    pub fn get(&self, site: FractureSite) -> &ShapPlot {
        match site {
            FractureSite::Vertebral => &self.vertebral,
            FractureSite::Hip => &self.hip,
            FractureSite::Any => &self.any,
        }
    }
}
