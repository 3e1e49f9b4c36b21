//! The seam between the submission pipeline and the scoring service.
//!
//! `ScoringBackend` is implemented by the HTTP client in `bono-http` and by
//! mocks in tests. The `Submitter` only ever talks to this trait.

use bono_contracts::{
    api::{RiskRequest, RiskResponse, ShapPlot, ShapPlotRequest, SitePlots},
    error::BonoResult,
};

/// A remote service that computes fracture risk and explains it.
///
/// Every method is a single attempt: implementations must not retry.
pub trait ScoringBackend: Send + Sync {
    /// Compute risk percentages for the patient over the requested horizon.
    fn risk(&self, request: &RiskRequest) -> BonoResult<RiskResponse>;

    /// SHAP waterfall plot for one fracture site.
    fn shap_plot(&self, request: &ShapPlotRequest) -> BonoResult<ShapPlot>;

    /// SHAP waterfall plots for every site in one call.
    fn shap_plots(&self, request: &RiskRequest) -> BonoResult<SitePlots>;
}
