//! Form validator for the Bono client.
//!
//! `FormValidator` turns raw form strings into a `PatientRecord`.
//! Validation runs in two phases:
//!
//! 1. **Per-field**: each field rule coerces its input (number, boolean,
//!    allowed value) and checks its range.
//! 2. **Cross-field**: `NotLessThan` and `Custom` rules run against the
//!    coerced values. A cross-field rule whose operands failed phase 1 is
//!    skipped; the operand's own error already explains the problem.
//!
//! Every failure is collected before returning, so the user sees the whole
//! error map after one submit.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use bono_contracts::{
    patient::PatientRecord,
    validation::{FieldRuleType, RangeMessages, ValidationErrors, ValidationSchema, FORM_KEY},
};

/// Raw form input: field key to the string the input widget holds.
pub type RawForm = BTreeMap<String, String>;

/// A caller-supplied cross-field check.
///
/// Receives the coerced form as a JSON object. Returns `Some(message)` when
/// the check fails, `None` on success.
pub type CustomRuleFn = Box<dyn Fn(&Map<String, Value>) -> Option<String> + Send + Sync>;

/// Coerces and validates raw patient form input against a schema.
pub struct FormValidator {
    schema: ValidationSchema,
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl FormValidator {
    pub fn new(schema: ValidationSchema) -> Self {
        Self {
            schema,
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom rule under `name`.
    ///
    /// The name must match the `function_name` of a `FieldRuleType::Custom`
    /// rule. Registering the same name twice replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Validate `raw` and build a `PatientRecord`, or return every failure.
    pub fn validate(&self, raw: &RawForm) -> Result<PatientRecord, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut coerced: Map<String, Value> = Map::new();

        let known: HashSet<&str> = self.schema.field_keys().collect();
        for key in raw.keys() {
            if !known.contains(key.as_str()) {
                warn!(schema_id = %self.schema.schema_id, field = %key, "unknown form field");
                errors.add(key.as_str(), "Unknown field.");
            }
        }

        // ── Phase 1: per-field coercion ──────────────────────────────────────
        for rule in &self.schema.rules {
            let Some(field) = rule.rule_type.field() else {
                continue;
            };
            debug!(rule_id = %rule.rule_id, field, "coercing field");

            let input = raw.get(field).map(|s| s.trim()).unwrap_or("");
            match coerce(&rule.rule_type, input) {
                Ok(value) => {
                    coerced.insert(field.to_string(), value);
                }
                Err(message) => {
                    warn!(rule_id = %rule.rule_id, field, %message, "field rule failed");
                    errors.add(field, message);
                }
            }
        }

        // ── Phase 2: cross-field and custom rules ────────────────────────────
        for rule in &self.schema.rules {
            let failure = match &rule.rule_type {
                FieldRuleType::NotLessThan { field, other, message } => {
                    match (number(&coerced, field), number(&coerced, other)) {
                        (Some(a), Some(b)) if a < b => Some(message.clone()),
                        _ => None,
                    }
                }
                FieldRuleType::Custom { function_name } => {
                    match self.custom_rules.get(function_name.as_str()) {
                        Some(f) => f(&coerced),
                        None => Some(format!(
                            "no custom rule registered for function name '{function_name}'"
                        )),
                    }
                }
                _ => None,
            };

            if let Some(message) = failure {
                warn!(rule_id = %rule.rule_id, %message, "cross-field rule failed");
                errors.add(FORM_KEY, message);
            }
        }

        if !errors.is_empty() {
            debug!(
                schema_id = %self.schema.schema_id,
                failed_fields = errors.len(),
                "validation failed"
            );
            return Err(errors);
        }

        serde_json::from_value(Value::Object(coerced)).map_err(|e| {
            // Only reachable when the schema does not cover every record field.
            let mut errors = ValidationErrors::new();
            errors.add(FORM_KEY, format!("incomplete patient data: {e}"));
            errors
        })
    }
}

fn number(values: &Map<String, Value>, field: &str) -> Option<f64> {
    values.get(field).and_then(Value::as_f64)
}

/// Coerce one trimmed input according to a per-field rule.
fn coerce(rule: &FieldRuleType, input: &str) -> Result<Value, String> {
    match rule {
        FieldRuleType::NumericRange { field, min, max, integer, default, messages } => {
            coerce_number(field, input, *min, *max, *integer, *default, messages)
        }
        FieldRuleType::Boolean { field, default } => coerce_bool(field, input, *default),
        FieldRuleType::AllowedValues { allowed, default, message, .. } => {
            let candidate = if input.is_empty() {
                default.as_deref().unwrap_or("")
            } else {
                input
            };
            allowed
                .iter()
                .find(|a| a.eq_ignore_ascii_case(candidate))
                .map(|a| Value::String(a.clone()))
                .ok_or_else(|| message.clone())
        }
        FieldRuleType::NotLessThan { .. } | FieldRuleType::Custom { .. } => Ok(Value::Null),
    }
}

fn coerce_number(
    field: &str,
    input: &str,
    min: f64,
    max: f64,
    integer: bool,
    default: Option<f64>,
    messages: &RangeMessages,
) -> Result<Value, String> {
    let value = if input.is_empty() {
        match default {
            Some(d) => d,
            None if messages.required.is_empty() => return Err(format!("{field} is required.")),
            None => return Err(messages.required.clone()),
        }
    } else {
        match input.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return Err(messages.invalid.clone()),
        }
    };

    if integer && value.fract() != 0.0 {
        return Err(messages.invalid.clone());
    }
    if value < min {
        return Err(messages.below.clone());
    }
    if value > max {
        return Err(messages.above.clone());
    }

    if integer {
        Ok(Value::Number(Number::from(value as i64)))
    } else {
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| messages.invalid.clone())
    }
}

fn coerce_bool(field: &str, input: &str, default: bool) -> Result<Value, String> {
    let value = match input.to_ascii_lowercase().as_str() {
        "" => default,
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        _ => return Err(format!("{field} must be true or false.")),
    };
    Ok(Value::Bool(value))
}

/// Render a record back into form strings, the inverse of `validate`.
pub fn raw_from_record(record: &PatientRecord) -> RawForm {
    let Ok(Value::Object(map)) = serde_json::to_value(record) else {
        return RawForm::new();
    };
    map.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
