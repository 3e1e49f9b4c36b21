//! Validation schema and error-map types.
//!
//! A `ValidationSchema` is a declarative list of `FieldRule`s. The validator
//! in `bono-schema` coerces raw form strings according to these rules and
//! collects every failure into a `ValidationErrors` map keyed by field.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error-map key for failures that belong to the form as a whole rather than
/// a single input (cross-field and custom rules).
pub const FORM_KEY: &str = "_form";

/// The full set of rules the validator applies to one form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSchema {
    /// Identifier for this schema (e.g. "patient-form-v3").
    pub schema_id: String,
    /// Rules applied in declaration order. Field rules first, cross-field
    /// rules after, so cross-field checks see coerced values.
    pub rules: Vec<FieldRule>,
}

impl ValidationSchema {
    /// Field keys this schema knows how to coerce.
    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(|r| r.rule_type.field())
    }
}

/// A single rule in a `ValidationSchema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// Stable identifier, used in logs.
    pub rule_id: String,
    /// Human-readable description.
    pub description: String,
    /// The check to apply.
    pub rule_type: FieldRuleType,
}

/// Messages shown for the ways a numeric input can fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeMessages {
    /// Value is below `min`.
    pub below: String,
    /// Value is above `max`.
    pub above: String,
    /// Input is not a number (or not a whole number for integer fields).
    pub invalid: String,
    /// Input is empty and the field has no default.
    pub required: String,
}

/// The kinds of checks the validator supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldRuleType {
    /// Coerce to a number and require `min <= value <= max`.
    NumericRange {
        field: String,
        min: f64,
        max: f64,
        /// Reject fractional input.
        integer: bool,
        /// Used when the input is empty or absent.
        default: Option<f64>,
        messages: RangeMessages,
    },

    /// Coerce to a boolean. Empty input takes `default`.
    Boolean { field: String, default: bool },

    /// The (trimmed, case-insensitive) input must be one of `allowed`.
    AllowedValues {
        field: String,
        allowed: Vec<String>,
        default: Option<String>,
        message: String,
    },

    /// Cross-field: the coerced value of `field` must be `>=` that of `other`.
    NotLessThan {
        field: String,
        other: String,
        message: String,
    },

    /// Delegate to a named function registered with the validator.
    Custom { function_name: String },
}

impl FieldRuleType {
    /// The input key a per-field rule coerces; `None` for cross-field and
    /// custom rules.
    pub fn field(&self) -> Option<&str> {
        match self {
            FieldRuleType::NumericRange { field, .. }
            | FieldRuleType::Boolean { field, .. }
            | FieldRuleType::AllowedValues { field, .. } => Some(field.as_str()),
            FieldRuleType::NotLessThan { .. } | FieldRuleType::Custom { .. } => None,
        }
    }
}

/// Every validation failure from one pass, keyed by field.
///
/// Cross-field and custom failures are filed under [`FORM_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields (including `_form`) with at least one failure.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages recorded for `field`, empty if it passed.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
