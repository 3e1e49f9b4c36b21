//! # bono-core
//!
//! The submission side of the fracture-risk calculator.
//!
//! This crate provides:
//! - The `ScoringBackend` trait the HTTP client implements
//! - `FormState`, which holds raw inputs and derives BMI as they change
//! - The `Submitter`, which keeps exactly one submission current at a time
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bono_core::{ExplainMode, FormState, Submitter};
//!
//! let submitter = Submitter::new(Box::new(client));
//! let mut form = FormState::new();
//! form.set("age", "72")?;
//! let submission = form.submit(&validator, &submitter, ExplainMode::Batch)?;
//! ```

pub mod form;
pub mod submitter;
pub mod traits;

pub use form::FormState;
pub use submitter::{ExplainMode, Submission, SubmissionStatus, Submitter, FAILURE_NOTICE};
pub use traits::ScoringBackend;
