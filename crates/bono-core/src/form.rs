//! Form state: raw inputs, the derived BMI, and the selected horizon.
//!
//! `FormState` holds exactly what the user typed, one string per catalog
//! key. Nothing is coerced until `validate`, so a half-typed value never
//! blocks editing another field.

use tracing::debug;

use bono_contracts::{
    error::{BonoError, BonoResult},
    patient::{self, PatientRecord},
    risk::RiskHorizon,
};
use bono_schema::{raw_from_record, FormValidator, RawForm};

use crate::submitter::{ExplainMode, Submission, Submitter};

/// The patient form as the user is filling it in.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: RawForm,
    horizon: RiskHorizon,
}

impl FormState {
    /// A form showing the default patient and the default horizon.
    pub fn new() -> Self {
        Self {
            values: raw_from_record(&PatientRecord::default()),
            horizon: RiskHorizon::default(),
        }
    }

    /// Set the raw input for `key`. Keys outside the catalog are rejected.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> BonoResult<()> {
        if !self.values.contains_key(key) {
            return Err(BonoError::UnknownField { key: key.to_string() });
        }
        let value = value.into();
        debug!(field = key, value = %value, "form input changed");
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &RawForm {
        &self.values
    }

    /// BMI from the current height and weight inputs, rounded to two
    /// decimals. `None` while either input is not a usable number.
    pub fn bmi(&self) -> Option<f64> {
        let parse = |key: &str| self.get(key)?.trim().parse::<f64>().ok();
        patient::bmi(parse("weight")?, parse("height")?).map(patient::round2)
    }

    pub fn horizon(&self) -> RiskHorizon {
        self.horizon
    }

    /// Select the horizon from the string a select widget yields.
    pub fn set_horizon_str(&mut self, value: &str) -> BonoResult<()> {
        self.horizon = value.parse()?;
        Ok(())
    }

    /// Coerce and validate the current inputs.
    pub fn validate(&self, validator: &FormValidator) -> BonoResult<PatientRecord> {
        validator.validate(&self.values).map_err(BonoError::Validation)
    }

    /// Validate, then submit with the selected horizon.
    ///
    /// Validation failures are returned without touching the network.
    pub fn submit(
        &self,
        validator: &FormValidator,
        submitter: &Submitter,
        explain: ExplainMode,
    ) -> BonoResult<Submission> {
        let record = self.validate(validator)?;
        submitter.submit(&record, self.horizon, explain)
    }

    /// Back to the defaults, as when the form is opened again.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
