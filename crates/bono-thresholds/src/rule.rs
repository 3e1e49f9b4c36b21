//! Threshold configuration types.
//!
//! A `ThresholdConfig` is deserialized from TOML. Every section is optional;
//! anything left out keeps its built-in value.
//!
//! Example:
//! ```toml
//! [sites.hip]
//! low_below = 3.0
//! high_above = 7.0
//!
//! [[mof]]
//! age = 40
//! lat = 2.9
//! uat = 7.8
//! vhrt = 10.3
//! ```

use serde::{Deserialize, Serialize};

use bono_contracts::risk::{FractureSite, RiskLevel};

/// Color-coding cut-offs for one site, in percent.
///
/// `risk < low_below` is low, `risk > high_above` is high, anything in
/// between (bounds included) is medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteThreshold {
    pub low_below: f64,
    pub high_above: f64,
}

impl SiteThreshold {
    pub const fn new(low_below: f64, high_above: f64) -> Self {
        Self { low_below, high_above }
    }

    pub fn level(&self, risk: f64) -> RiskLevel {
        if risk < self.low_below {
            RiskLevel::Low
        } else if risk > self.high_above {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

/// Per-site cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteThresholds {
    pub vertebral: SiteThreshold,
    pub hip: SiteThreshold,
    pub any: SiteThreshold,
}

impl SiteThresholds {
    pub fn get(&self, site: FractureSite) -> &SiteThreshold {
        match site {
            FractureSite::Vertebral => &self.vertebral,
            FractureSite::Hip => &self.hip,
            FractureSite::Any => &self.any,
        }
    }
}

impl Default for SiteThresholds {
    fn default() -> Self {
        Self {
            vertebral: SiteThreshold::new(3.0, 10.0),
            hip: SiteThreshold::new(3.0, 7.0),
            any: SiteThreshold::new(3.0, 10.0),
        }
    }
}

/// One row of the major-osteoporotic-fracture intervention table.
///
/// All thresholds are 10-year risks in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MofRow {
    pub age: f64,
    /// Lower assessment threshold.
    pub lat: f64,
    /// Upper assessment threshold.
    pub uat: f64,
    /// Very-high-risk threshold.
    pub vhrt: f64,
}

const fn row(age: f64, lat: f64, uat: f64, vhrt: f64) -> MofRow {
    MofRow { age, lat, uat, vhrt }
}

pub const DEFAULT_MOF_TABLE: [MofRow; 7] = [
    row(40.0, 2.9, 7.8, 10.3),
    row(45.0, 3.0, 8.0, 10.6),
    row(50.0, 4.2, 10.9, 14.6),
    row(55.0, 5.3, 13.3, 17.7),
    row(60.0, 6.1, 15.0, 20.0),
    row(65.0, 8.5, 19.9, 26.5),
    row(70.0, 11.6, 25.6, 34.1),
];

/// The top-level structure deserialized from a thresholds TOML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub sites: SiteThresholds,
    /// Rows in ascending age order.
    pub mof: Vec<MofRow>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            sites: SiteThresholds::default(),
            mof: DEFAULT_MOF_TABLE.to_vec(),
        }
    }
}
