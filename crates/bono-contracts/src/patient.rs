//! The patient record submitted to the scoring service.
//!
//! Field names are the wire names. Treatments are grouped in Rust but
//! serialized flat (`bisphosphonate_prior`, `bisphosphonate_current`, ...),
//! which is what the scoring service expects.

use serde::{Deserialize, Serialize};

/// Patient sex as the scoring service encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Female,
    Male,
}

/// The five treatment categories recorded on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreatmentKind {
    Bisphosphonate,
    Denosumab,
    Serm,
    Teriparatide,
    Hrt,
}

impl TreatmentKind {
    pub const ALL: [TreatmentKind; 5] = [
        TreatmentKind::Bisphosphonate,
        TreatmentKind::Denosumab,
        TreatmentKind::Serm,
        TreatmentKind::Teriparatide,
        TreatmentKind::Hrt,
    ];

    /// Wire prefix for this treatment's flags.
    pub fn key(self) -> &'static str {
        match self {
            TreatmentKind::Bisphosphonate => "bisphosphonate",
            TreatmentKind::Denosumab => "denosumab",
            TreatmentKind::Serm => "serm",
            TreatmentKind::Teriparatide => "teriparatide",
            TreatmentKind::Hrt => "hrt",
        }
    }
}

/// Prior / current / newly started flags for one treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreatmentStatus {
    pub prior: bool,
    pub current: bool,
    pub new: bool,
}

impl TreatmentStatus {
    pub fn any(&self) -> bool {
        self.prior || self.current || self.new
    }
}

/// Treatment history, flattened into the patient record on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Treatments {
    pub bisphosphonate_prior: bool,
    pub bisphosphonate_current: bool,
    pub bisphosphonate_new: bool,
    pub denosumab_prior: bool,
    pub denosumab_current: bool,
    pub denosumab_new: bool,
    pub serm_prior: bool,
    pub serm_current: bool,
    pub serm_new: bool,
    pub teriparatide_prior: bool,
    pub teriparatide_current: bool,
    pub teriparatide_new: bool,
    pub hrt_prior: bool,
    pub hrt_current: bool,
    pub hrt_new: bool,
}

impl Treatments {
    pub fn status(&self, kind: TreatmentKind) -> TreatmentStatus {
        let (prior, current, new) = match kind {
            TreatmentKind::Bisphosphonate => (
                self.bisphosphonate_prior,
                self.bisphosphonate_current,
                self.bisphosphonate_new,
            ),
            TreatmentKind::Denosumab => {
                (self.denosumab_prior, self.denosumab_current, self.denosumab_new)
            }
            TreatmentKind::Serm => (self.serm_prior, self.serm_current, self.serm_new),
            TreatmentKind::Teriparatide => (
                self.teriparatide_prior,
                self.teriparatide_current,
                self.teriparatide_new,
            ),
            TreatmentKind::Hrt => (self.hrt_prior, self.hrt_current, self.hrt_new),
        };
        TreatmentStatus { prior, current, new }
    }

    pub fn set_status(&mut self, kind: TreatmentKind, status: TreatmentStatus) {
        let (prior, current, new) = match kind {
            TreatmentKind::Bisphosphonate => (
                &mut self.bisphosphonate_prior,
                &mut self.bisphosphonate_current,
                &mut self.bisphosphonate_new,
            ),
            TreatmentKind::Denosumab => (
                &mut self.denosumab_prior,
                &mut self.denosumab_current,
                &mut self.denosumab_new,
            ),
            TreatmentKind::Serm => (&mut self.serm_prior, &mut self.serm_current, &mut self.serm_new),
            TreatmentKind::Teriparatide => (
                &mut self.teriparatide_prior,
                &mut self.teriparatide_current,
                &mut self.teriparatide_new,
            ),
            TreatmentKind::Hrt => (&mut self.hrt_prior, &mut self.hrt_current, &mut self.hrt_new),
        };
        *prior = status.prior;
        *current = status.current;
        *new = status.new;
    }
}

/// A validated patient record, ready to submit.
///
/// Invariant (enforced by the validator, not the type):
/// `previous_fracture >= recent_fracture`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub sex: Sex,
    /// Years.
    pub age: u32,
    /// Centimetres.
    pub height: u32,
    /// Kilograms.
    pub weight: u32,

    pub hip_fracture_parents: bool,
    pub osteoporotic_fracture_parents: bool,
    pub corticosteroids: bool,
    /// mg/day.
    pub steroid_daily_dosage: u32,
    pub aromatase_inhibitors: bool,
    pub antiepileptics: bool,
    pub rheumatoid_arthritis: bool,
    pub ankylosing_spondylitis: bool,
    /// Falls in the last 12 months.
    pub number_of_falls: u32,
    pub immobility: bool,
    pub type_1_diabetes: bool,
    pub copd: bool,
    pub gastrointestinal_disease: bool,
    pub early_menopause: bool,
    pub hyperpara: bool,
    pub falling_test_abnormal: bool,
    pub alcohol: bool,
    pub nicotin: bool,
    pub decrease_in_height: bool,
    pub low_back_pain: bool,
    pub hyperkyphosis: bool,
    pub previous_fracture: u32,
    /// Fractures in the last 2 years.
    pub recent_fracture: u32,

    pub tscore_neck: f64,
    pub tscore_total_hip: f64,
    pub tscore_ls: f64,
    pub tbs: f64,

    #[serde(flatten)]
    pub treatments: Treatments,
}

impl PatientRecord {
    /// Body-mass index, `weight / (height / 100)^2`.
    ///
    /// Returns `None` for a zero height.
    pub fn bmi(&self) -> Option<f64> {
        bmi(f64::from(self.weight), f64::from(self.height))
    }
}

impl Default for PatientRecord {
    /// The values a freshly opened form shows.
    fn default() -> Self {
        Self {
            sex: Sex::Female,
            age: 65,
            height: 160,
            weight: 60,
            hip_fracture_parents: false,
            osteoporotic_fracture_parents: false,
            corticosteroids: false,
            steroid_daily_dosage: 0,
            aromatase_inhibitors: false,
            antiepileptics: false,
            rheumatoid_arthritis: false,
            ankylosing_spondylitis: false,
            number_of_falls: 0,
            immobility: false,
            type_1_diabetes: false,
            copd: false,
            gastrointestinal_disease: false,
            early_menopause: false,
            hyperpara: false,
            falling_test_abnormal: false,
            alcohol: false,
            nicotin: false,
            decrease_in_height: false,
            low_back_pain: false,
            hyperkyphosis: false,
            previous_fracture: 0,
            recent_fracture: 0,
            tscore_neck: -2.0,
            tscore_total_hip: -2.0,
            tscore_ls: -2.0,
            tbs: 1.3,
            treatments: Treatments::default(),
        }
    }
}

/// Body-mass index from weight in kg and height in cm.
///
/// `None` unless both are finite and height is positive.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !weight_kg.is_finite() || !height_cm.is_finite() || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Round to two decimals, the precision the form displays BMI with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
