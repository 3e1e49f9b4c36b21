//! Threshold engine implementation.
//!
//! `ThresholdEngine` loads a `ThresholdConfig` from TOML (or uses the
//! built-in values) and answers two questions about a returned risk:
//!
//! 1. Which color bucket does a site's percentage fall in?
//! 2. Which MOF intervention category does it reach for the patient's age?
//!
//! MOF evaluation scales the percentage to a 10-year equivalent
//! (`risk × 10 / horizon`) and compares it with LAT / UAT / VHRT values
//! interpolated linearly between the two table rows around the patient's
//! age. Ages outside the table use the nearest row.

use std::path::Path;

use tracing::{debug, warn};

use bono_contracts::{
    error::{BonoError, BonoResult},
    risk::{FractureSite, MofCategory, RiskHorizon, RiskLevel, SiteRisks},
};

use crate::rule::{MofRow, SiteThreshold, ThresholdConfig};

/// Buckets returned risk percentages.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    config: ThresholdConfig,
}

impl ThresholdEngine {
    /// Build an engine from an already-parsed config, checking it is usable.
    pub fn new(config: ThresholdConfig) -> BonoResult<Self> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    /// Parse `s` as TOML and build a `ThresholdEngine`.
    ///
    /// Returns `BonoError::Config` if the TOML is malformed, does not match
    /// `ThresholdConfig`, or describes unusable thresholds.
    pub fn from_toml_str(s: &str) -> BonoResult<Self> {
        let config: ThresholdConfig = toml::from_str(s).map_err(|e| BonoError::Config {
            reason: format!("failed to parse thresholds TOML: {e}"),
        })?;
        Self::new(config)
    }

    /// Read the file at `path` and parse it as TOML threshold configuration.
    pub fn from_file(path: &Path) -> BonoResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BonoError::Config {
            reason: format!("failed to read thresholds file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Color bucket for one site's percentage.
    pub fn level(&self, site: FractureSite, risk: f64) -> RiskLevel {
        let level = self.config.sites.get(site).level(risk);
        debug!(site = %site, risk, bucket = %level, "bucketed risk");
        level
    }

    /// Color bucket for every site, in display order.
    pub fn levels(&self, risks: &SiteRisks) -> Vec<(FractureSite, f64, RiskLevel)> {
        risks
            .iter()
            .map(|(site, risk)| (site, risk, self.level(site, risk)))
            .collect()
    }

    /// MOF intervention category for a patient of `age` with `risk` percent
    /// over `horizon`.
    pub fn mof_category(&self, age: f64, risk: f64, horizon: RiskHorizon) -> MofCategory {
        let ten_year = risk * 10.0 / f64::from(horizon.years());
        let limits = self.mof_limits(age);

        let category = if ten_year < limits.lat {
            MofCategory::Low
        } else if ten_year < limits.uat {
            MofCategory::Moderate
        } else if ten_year < limits.vhrt {
            MofCategory::High
        } else {
            MofCategory::VeryHigh
        };

        debug!(
            age,
            risk,
            horizon = horizon.years(),
            ten_year,
            lat = limits.lat,
            uat = limits.uat,
            vhrt = limits.vhrt,
            category = %category,
            "evaluated MOF category"
        );
        category
    }

    /// LAT / UAT / VHRT for `age`, interpolated between table rows.
    pub fn mof_limits(&self, age: f64) -> MofRow {
        let table = &self.config.mof;
        // validate_config guarantees a non-empty, age-ascending table.
        let first = table[0];
        let last = table[table.len() - 1];

        if age <= first.age {
            return MofRow { age, ..first };
        }
        if age >= last.age {
            return MofRow { age, ..last };
        }

        let upper_idx = table.iter().position(|r| r.age >= age).unwrap_or(table.len() - 1);
        let lower = table[upper_idx - 1];
        let upper = table[upper_idx];
        let ratio = (age - lower.age) / (upper.age - lower.age);
        let lerp = |a: f64, b: f64| a + (b - a) * ratio;

        MofRow {
            age,
            lat: lerp(lower.lat, upper.lat),
            uat: lerp(lower.uat, upper.uat),
            vhrt: lerp(lower.vhrt, upper.vhrt),
        }
    }
}

impl Default for ThresholdEngine {
    fn default() -> Self {
        Self {
            config: ThresholdConfig::default(),
        }
    }
}

fn validate_config(config: &ThresholdConfig) -> BonoResult<()> {
    for site in FractureSite::ALL {
        let SiteThreshold { low_below, high_above } = *config.sites.get(site);
        if !(low_below.is_finite() && high_above.is_finite()) || low_below > high_above {
            warn!(site = %site, low_below, high_above, "rejecting site thresholds");
            return Err(BonoError::Config {
                reason: format!(
                    "{site} thresholds must satisfy low_below <= high_above, got {low_below} and {high_above}"
                ),
            });
        }
    }

    if config.mof.is_empty() {
        return Err(BonoError::Config {
            reason: "MOF threshold table must have at least one row".to_string(),
        });
    }
    for pair in config.mof.windows(2) {
        if pair[1].age <= pair[0].age {
            return Err(BonoError::Config {
                reason: format!(
                    "MOF threshold table ages must be strictly ascending ({} then {})",
                    pair[0].age, pair[1].age
                ),
            });
        }
    }
    for r in &config.mof {
        if !(r.lat <= r.uat && r.uat <= r.vhrt) {
            return Err(BonoError::Config {
                reason: format!("MOF row for age {} must satisfy lat <= uat <= vhrt", r.age),
            });
        }
    }
    Ok(())
}
