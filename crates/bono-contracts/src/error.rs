//! Error types for the Bono client pipeline.
//!
//! All fallible operations return `BonoResult<T>`. Validation failures carry
//! the full per-field error map so callers can re-prompt the user without a
//! second pass.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// The unified error type for the Bono workspace.
#[derive(Debug, Error)]
pub enum BonoError {
    /// The form input failed client-side validation. Never sent to the server.
    #[error("patient data failed validation: {0}")]
    Validation(ValidationErrors),

    /// A form key that is not part of the field catalog.
    #[error("unknown form field '{key}'")]
    UnknownField { key: String },

    /// A risk horizon outside the supported 1–7 year window.
    #[error("risk horizon must be between 1 and 7 years, got '{value}'")]
    InvalidHorizon { value: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The scoring service answered with a non-success status.
    #[error("scoring service returned {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The response body could not be decoded or failed verification.
    #[error("could not decode scoring response: {reason}")]
    Decode { reason: String },

    /// Writing local output (plot images) failed.
    #[error("failed to write output: {reason}")]
    Output { reason: String },

    /// A newer submission started before this one finished; its response
    /// was dropped.
    #[error("submission {ticket} was superseded by a newer submission")]
    Superseded { ticket: u64 },
}

impl BonoError {
    /// True for failures of the network call itself, as opposed to local
    /// validation or configuration problems.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            BonoError::Transport { .. } | BonoError::Server { .. } | BonoError::Decode { .. }
        )
    }
}

impl From<ValidationErrors> for BonoError {
    fn from(errors: ValidationErrors) -> Self {
        BonoError::Validation(errors)
    }
}

/// Convenience alias used throughout the Bono crates.
pub type BonoResult<T> = Result<T, BonoError>;
