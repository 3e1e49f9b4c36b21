//! # bono-contracts
//!
//! Shared types, the field catalog, and error contracts for the Bono
//! fracture-risk client.
//!
//! All crates in the workspace import from here. No network or validation
//! logic lives in this crate, only data definitions and error types.

pub mod api;
pub mod catalog;
pub mod error;
pub mod patient;
pub mod risk;
pub mod validation;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use api::{RiskRequest, RiskResponse, ShapPlot, ShapPlotRequest};
    use catalog::{FeatureCategory, FeatureKind, FEATURES};
    use error::BonoError;
    use patient::{PatientRecord, TreatmentKind, TreatmentStatus};
    use risk::{FractureSite, RiskHorizon};
    use validation::{ValidationErrors, FORM_KEY};

    // ── Catalog ──────────────────────────────────────────────────────────────

    #[test]
    fn catalog_keys_match_patient_record_wire_fields() {
        let record = serde_json::to_value(PatientRecord::default()).unwrap();
        let wire: BTreeSet<String> = record.as_object().unwrap().keys().cloned().collect();
        let catalog: BTreeSet<String> = catalog::form_keys().into_iter().collect();

        assert_eq!(wire, catalog);
        assert_eq!(catalog.len(), 46);
    }

    #[test]
    fn catalog_treatments_expand_to_three_phases() {
        let hrt = catalog::find("hrt").unwrap();
        assert_eq!(hrt.kind, FeatureKind::Treatment);
        assert_eq!(hrt.form_keys(), vec!["hrt_prior", "hrt_current", "hrt_new"]);
    }

    #[test]
    fn catalog_ids_are_unique() {
        let ids: BTreeSet<u32> = FEATURES.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), FEATURES.len());
        assert_eq!(catalog::by_category(FeatureCategory::Bmd).count(), 4);
        assert_eq!(catalog::by_category(FeatureCategory::Treatment).count(), 5);
    }

    // ── PatientRecord ────────────────────────────────────────────────────────

    #[test]
    fn default_record_bmi() {
        let bmi = PatientRecord::default().bmi().unwrap();
        assert!((bmi - 23.4375).abs() < 1e-9);
        assert_eq!(patient::round2(bmi), 23.44);
    }

    #[test]
    fn bmi_rejects_zero_height() {
        assert!(patient::bmi(60.0, 0.0).is_none());
        assert!(patient::bmi(f64::NAN, 160.0).is_none());
    }

    #[test]
    fn treatments_serialize_flat() {
        let mut record = PatientRecord::default();
        record.treatments.set_status(
            TreatmentKind::Denosumab,
            TreatmentStatus { prior: false, current: true, new: false },
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["denosumab_current"], true);
        assert_eq!(json["denosumab_prior"], false);
        assert!(json.get("treatments").is_none());
        assert!(record.treatments.status(TreatmentKind::Denosumab).any());
        assert!(!record.treatments.status(TreatmentKind::Hrt).any());
    }

    // ── RiskHorizon ──────────────────────────────────────────────────────────

    #[test]
    fn horizon_bounds() {
        assert!(RiskHorizon::new(0).is_err());
        assert!(RiskHorizon::new(8).is_err());
        assert_eq!(RiskHorizon::all().count(), 7);
        assert_eq!(RiskHorizon::default().years(), 2);
        assert!("seven".parse::<RiskHorizon>().is_err());
        assert_eq!(" 5 ".parse::<RiskHorizon>().unwrap().years(), 5);
    }

    #[test]
    fn horizon_serializes_as_string_and_accepts_numbers() {
        let request = RiskRequest {
            risk_horizon: RiskHorizon::new(3).unwrap(),
            patient_data: PatientRecord::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["riskHorizon"], "3");
        assert_eq!(json["patientData"]["sex"], "female");

        let from_number: RiskHorizon = serde_json::from_str("4").unwrap();
        assert_eq!(from_number.years(), 4);
        assert!(serde_json::from_str::<RiskHorizon>("\"9\"").is_err());
        assert!(serde_json::from_str::<RiskHorizon>("300").is_err());
    }

    #[test]
    fn shap_request_uses_fx_type() {
        let request = ShapPlotRequest {
            risk_horizon: RiskHorizon::default(),
            patient_data: PatientRecord::default(),
            fx_type: FractureSite::Hip,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["fxType"], "hip");
    }

    #[test]
    fn risk_response_message_is_optional() {
        let response: RiskResponse =
            serde_json::from_str(r#"{"risks":{"vertebral":1.5,"hip":0.25,"any":4.0}}"#).unwrap();
        assert!(response.message.is_none());
        assert_eq!(response.risks.get(FractureSite::Hip), 0.25);
    }

    // ── ShapPlot ─────────────────────────────────────────────────────────────

    #[test]
    fn shap_plot_decodes_bare_and_data_url() {
        let bare = ShapPlot("iVBORw0=".to_string());
        assert_eq!(bare.decode().unwrap(), vec![0x89, 0x50, 0x4e, 0x47, 0x0d]);

        let url = ShapPlot("data:image/png;base64,iVBORw0=".to_string());
        assert_eq!(url.decode().unwrap(), bare.decode().unwrap());

        let broken = ShapPlot("not base64!".to_string());
        assert!(matches!(broken.decode(), Err(BonoError::Decode { .. })));
    }

    // ── ValidationErrors ─────────────────────────────────────────────────────

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("age", "Age must be at most 120.");
        errors.add(FORM_KEY, "Previous fractures must be greater than or equal to recent fractures.");
        errors.add("age", "second");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("age").len(), 2);
        assert!(errors.get("height").is_empty());

        let msg = BonoError::from(errors).to_string();
        assert!(msg.contains("failed validation"));
        assert!(msg.contains("age: Age must be at most 120."));
    }

    // ── BonoError display messages ───────────────────────────────────────────

    #[test]
    fn error_server_display() {
        let err = BonoError::Server {
            status: 500,
            detail: "Internal server error during risk calculation".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("risk calculation"));
        assert!(err.is_network());
    }

    #[test]
    fn error_superseded_display() {
        let err = BonoError::Superseded { ticket: 4 };
        assert!(err.to_string().contains("submission 4"));
        assert!(!err.is_network());
    }

    #[test]
    fn error_output_display() {
        let err = BonoError::Output { reason: "failed to write plot 'plots/hip.png'".to_string() };
        assert!(err.to_string().starts_with("failed to write output"));
        assert!(!err.is_network());
    }

    #[test]
    fn error_horizon_display() {
        let err = RiskHorizon::new(9).unwrap_err();
        assert!(err.to_string().contains("between 1 and 7"));
        assert!(err.to_string().contains("'9'"));
    }
}
