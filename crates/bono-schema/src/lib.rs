//! # bono-schema
//!
//! Client-side validation for the patient form.
//!
//! This crate provides [`engine::FormValidator`], which coerces the raw
//! strings a form collects into a typed
//! [`PatientRecord`](bono_contracts::patient::PatientRecord), and
//! [`defaults::patient_form_schema`], the schema the calculator ships with.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use bono_schema::{defaults::patient_form_schema, engine::FormValidator};
//!
//! let validator = FormValidator::new(patient_form_schema());
//! match validator.validate(&raw) {
//!     Ok(record) => submit(record),
//!     Err(errors) => show(errors),
//! }
//! ```

pub mod defaults;
pub mod engine;

pub use defaults::patient_form_schema;
pub use engine::{raw_from_record, FormValidator, RawForm};
