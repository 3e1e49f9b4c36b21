//! The static field catalog.
//!
//! One `Feature` per clinical input, in form order. The catalog only
//! describes inputs; ranges and defaults live in the validation schema.

use serde::Serialize;

/// Which section of the form a feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureCategory {
    Demographics,
    Anamnesis,
    #[serde(rename = "BMD")]
    Bmd,
    Treatment,
}

impl FeatureCategory {
    pub fn label(self) -> &'static str {
        match self {
            FeatureCategory::Demographics => "Demographics",
            FeatureCategory::Anamnesis => "Anamnesis",
            FeatureCategory::Bmd => "Bone mineral density",
            FeatureCategory::Treatment => "Treatment",
        }
    }
}

/// The input type a feature expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Boolean,
    Number,
    /// One of a fixed set of strings.
    Choice,
    /// Three boolean inputs: `<key>_prior`, `<key>_current`, `<key>_new`.
    Treatment,
}

/// Phases a treatment can be recorded in.
pub const TREATMENT_PHASES: [&str; 3] = ["prior", "current", "new"];

/// A single catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Feature {
    pub id: u32,
    pub name: &'static str,
    /// Help text shown next to the input. May be empty.
    pub description: &'static str,
    pub category: FeatureCategory,
    /// Wire name of the field (prefix, for treatments).
    pub key: &'static str,
    pub kind: FeatureKind,
}

impl Feature {
    /// The form keys this feature binds to.
    pub fn form_keys(&self) -> Vec<String> {
        match self.kind {
            FeatureKind::Treatment => TREATMENT_PHASES
                .iter()
                .map(|phase| format!("{}_{}", self.key, phase))
                .collect(),
            _ => vec![self.key.to_string()],
        }
    }
}

const fn feature(
    id: u32,
    name: &'static str,
    description: &'static str,
    category: FeatureCategory,
    key: &'static str,
    kind: FeatureKind,
) -> Feature {
    Feature { id, name, description, category, key, kind }
}

use FeatureCategory::{Anamnesis, Bmd, Demographics, Treatment};
use FeatureKind::{Boolean, Choice, Number};

/// Every clinical input, in form order.
pub static FEATURES: &[Feature] = &[
    feature(100, "Sex", "", Demographics, "sex", Choice),
    feature(101, "Age", "Years", Demographics, "age", Number),
    feature(102, "Height", "cm", Demographics, "height", Number),
    feature(103, "Weight", "kg", Demographics, "weight", Number),
    feature(1, "Hip Fracture Parents", "", Anamnesis, "hip_fracture_parents", Boolean),
    feature(2, "Osteoporotic Fracture Parents", "", Anamnesis, "osteoporotic_fracture_parents", Boolean),
    feature(3, "Corticosteroids", "≥5 mg/day for ≥3 months", Anamnesis, "corticosteroids", Boolean),
    feature(4, "Steroid Daily Dosage", "mg/day", Anamnesis, "steroid_daily_dosage", Number),
    feature(5, "Aromatase Inhibitors", "", Anamnesis, "aromatase_inhibitors", Boolean),
    feature(6, "Antiepileptics", "", Anamnesis, "antiepileptics", Boolean),
    feature(7, "Rheumatoid Arthritis", "", Anamnesis, "rheumatoid_arthritis", Boolean),
    feature(8, "Ankylosing Spondylitis", "", Anamnesis, "ankylosing_spondylitis", Boolean),
    feature(9, "Number of Falls", "Number of falls in the last 12 months.", Anamnesis, "number_of_falls", Number),
    feature(10, "Immobility", "Need for walking aid", Anamnesis, "immobility", Boolean),
    feature(11, "Type 1 Diabetes", "", Anamnesis, "type_1_diabetes", Boolean),
    feature(12, "COPD", "Chronic obstructive pulmonary disease", Anamnesis, "copd", Boolean),
    feature(13, "Gastrointestinal Disease", "", Anamnesis, "gastrointestinal_disease", Boolean),
    feature(14, "Early Menopause", "Menopause before 45 years old", Anamnesis, "early_menopause", Boolean),
    feature(15, "Hyperpara", "Primary hyperparathyroidism", Anamnesis, "hyperpara", Boolean),
    feature(16, "Falling Test: abnormal", "", Anamnesis, "falling_test_abnormal", Boolean),
    feature(17, "Alcohol", ">30g/day", Anamnesis, "alcohol", Boolean),
    feature(18, "Nicotin", "", Anamnesis, "nicotin", Boolean),
    feature(19, "Decrease in Height", "", Anamnesis, "decrease_in_height", Boolean),
    feature(20, "Low Back Pain", "", Anamnesis, "low_back_pain", Boolean),
    feature(21, "Hyperkyphosis", "", Anamnesis, "hyperkyphosis", Boolean),
    feature(22, "Previous Fractures", "", Anamnesis, "previous_fracture", Number),
    feature(23, "Recent Fractures", "Number of fractures in the last 2 years.", Anamnesis, "recent_fracture", Number),
    feature(24, "Femoral Neck BMD", "T-score", Bmd, "tscore_neck", Number),
    feature(25, "Total Hip BMD", "T-score", Bmd, "tscore_total_hip", Number),
    feature(26, "Lumbar Spine BMD", "T-score", Bmd, "tscore_ls", Number),
    feature(27, "TBS", "Trabecular Bone Score", Bmd, "tbs", Number),
    feature(28, "Bisphosphonate", "", Treatment, "bisphosphonate", FeatureKind::Treatment),
    feature(29, "Denosumab", "", Treatment, "denosumab", FeatureKind::Treatment),
    feature(30, "SERM", "Selective Estrogen Receptor Modulator", Treatment, "serm", FeatureKind::Treatment),
    feature(31, "Teriparatide", "", Treatment, "teriparatide", FeatureKind::Treatment),
    feature(32, "HRT", "Hormone Replacement Therapy", Treatment, "hrt", FeatureKind::Treatment),
];

/// Look up a feature by its key (treatment prefix for treatments).
pub fn find(key: &str) -> Option<&'static Feature> {
    FEATURES.iter().find(|f| f.key == key)
}

/// Features in `category`, in form order.
pub fn by_category(category: FeatureCategory) -> impl Iterator<Item = &'static Feature> {
    FEATURES.iter().filter(move |f| f.category == category)
}

/// Every form key the catalog defines, treatments expanded.
pub fn form_keys() -> Vec<String> {
    FEATURES.iter().flat_map(Feature::form_keys).collect()
}
