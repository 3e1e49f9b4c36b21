//! # bono-thresholds
//!
//! Turns the percentages the scoring service returns into something a
//! clinician can read at a glance.
//!
//! ## Overview
//!
//! [`ThresholdEngine`] buckets each site's risk into low / medium / high
//! using per-site cut-offs, and maps a risk to an age-dependent MOF
//! intervention category. Both tables have built-in values and can be
//! overridden from a TOML document.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use bono_thresholds::ThresholdEngine;
//!
//! let engine = ThresholdEngine::from_file(Path::new("config/thresholds.toml"))?;
//! let level = engine.level(FractureSite::Hip, 5.0); // RiskLevel::Medium
//! ```

pub mod engine;
pub mod rule;

pub use engine::ThresholdEngine;
pub use rule::{MofRow, SiteThreshold, SiteThresholds, ThresholdConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
