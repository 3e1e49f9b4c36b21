//! The patient form schema the calculator ships with.

use bono_contracts::{
    catalog::{FeatureKind, FEATURES},
    validation::{FieldRule, FieldRuleType, RangeMessages, ValidationSchema},
};

pub const PATIENT_FORM_SCHEMA_ID: &str = "patient-form-v3";

/// Name of the cross-field fracture-count rule.
pub const FRACTURE_ORDER_RULE: &str = "fracture-count-order";

struct Range {
    field: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    integer: bool,
    default: Option<f64>,
    required: &'static str,
}

const RANGES: &[Range] = &[
    Range { field: "age", label: "Age", min: 0.0, max: 120.0, integer: true, default: None, required: "Enter the patient's age." },
    Range { field: "height", label: "Height", min: 50.0, max: 225.0, integer: true, default: None, required: "Enter the patient's height." },
    Range { field: "weight", label: "Weight", min: 20.0, max: 400.0, integer: true, default: None, required: "Enter the patient's weight." },
    Range { field: "steroid_daily_dosage", label: "Steroid daily dosage", min: 0.0, max: 100.0, integer: true, default: Some(0.0), required: "" },
    Range { field: "number_of_falls", label: "Number of falls", min: 0.0, max: 100.0, integer: true, default: Some(0.0), required: "" },
    Range { field: "previous_fracture", label: "Previous fractures", min: 0.0, max: 20.0, integer: true, default: Some(0.0), required: "" },
    Range { field: "recent_fracture", label: "Recent fractures", min: 0.0, max: 10.0, integer: true, default: Some(0.0), required: "" },
    Range { field: "tscore_neck", label: "Femoral neck T-score", min: -10.0, max: 10.0, integer: false, default: None, required: "Enter a T-score." },
    Range { field: "tscore_total_hip", label: "Total hip T-score", min: -10.0, max: 10.0, integer: false, default: None, required: "Enter a T-score." },
    Range { field: "tscore_ls", label: "Lumbar spine T-score", min: -10.0, max: 10.0, integer: false, default: None, required: "Enter a T-score." },
    Range { field: "tbs", label: "TBS", min: 0.0, max: 2.0, integer: false, default: None, required: "Enter a TBS." },
];

fn range_rule(r: &Range) -> FieldRule {
    let invalid = if r.integer {
        format!("{} must be a whole number.", r.label)
    } else {
        format!("{} must be a number.", r.label)
    };
    FieldRule {
        rule_id: format!("range-{}", r.field),
        description: format!("{} between {} and {}", r.label, r.min, r.max),
        rule_type: FieldRuleType::NumericRange {
            field: r.field.to_string(),
            min: r.min,
            max: r.max,
            integer: r.integer,
            default: r.default,
            messages: RangeMessages {
                below: format!("{} must be at least {}.", r.label, r.min),
                above: format!("{} must be at most {}.", r.label, r.max),
                invalid,
                required: r.required.to_string(),
            },
        },
    }
}

fn boolean_rule(field: String) -> FieldRule {
    FieldRule {
        rule_id: format!("bool-{field}"),
        description: format!("{field} is true or false"),
        rule_type: FieldRuleType::Boolean { field, default: false },
    }
}

/// Build the default patient form schema.
///
/// Booleans and treatment flags come from the field catalog so a new
/// catalog flag is validated without touching this function.
pub fn patient_form_schema() -> ValidationSchema {
    let mut rules = vec![FieldRule {
        rule_id: "allowed-sex".to_string(),
        description: "calculator is limited to female patients".to_string(),
        rule_type: FieldRuleType::AllowedValues {
            field: "sex".to_string(),
            allowed: vec!["female".to_string()],
            default: Some("female".to_string()),
            message: "The calculator is currently only available for female patients.".to_string(),
        },
    }];

    rules.extend(RANGES.iter().map(range_rule));

    for feature in FEATURES {
        match feature.kind {
            FeatureKind::Boolean | FeatureKind::Treatment => {
                rules.extend(feature.form_keys().into_iter().map(boolean_rule));
            }
            FeatureKind::Number | FeatureKind::Choice => {}
        }
    }

    rules.push(FieldRule {
        rule_id: FRACTURE_ORDER_RULE.to_string(),
        description: "previous fractures include recent fractures".to_string(),
        rule_type: FieldRuleType::NotLessThan {
            field: "previous_fracture".to_string(),
            other: "recent_fracture".to_string(),
            message: "Previous fractures must be greater than or equal to recent fractures."
                .to_string(),
        },
    });

    ValidationSchema {
        schema_id: PATIENT_FORM_SCHEMA_ID.to_string(),
        rules,
    }
}
