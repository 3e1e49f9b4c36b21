//! Risk horizon, per-site risk results, and risk level types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BonoError;

/// Forecast window in whole years, 1 through 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RiskHorizon(u8);

impl RiskHorizon {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    pub fn new(years: u8) -> Result<Self, BonoError> {
        if (Self::MIN..=Self::MAX).contains(&years) {
            Ok(Self(years))
        } else {
            Err(BonoError::InvalidHorizon {
                value: years.to_string(),
            })
        }
    }

    pub fn years(self) -> u8 {
        self.0
    }

    /// Every selectable horizon, shortest first.
    pub fn all() -> impl Iterator<Item = RiskHorizon> {
        (Self::MIN..=Self::MAX).map(RiskHorizon)
    }
}

impl Default for RiskHorizon {
    fn default() -> Self {
        Self(2)
    }
}

impl fmt::Display for RiskHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RiskHorizon {
    type Err = BonoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let years: u8 = s.trim().parse().map_err(|_| BonoError::InvalidHorizon {
            value: s.to_string(),
        })?;
        Self::new(years)
    }
}

impl TryFrom<u8> for RiskHorizon {
    type Error = BonoError;

    fn try_from(years: u8) -> Result<Self, Self::Error> {
        Self::new(years)
    }
}

// The scoring service receives the horizon as a string ("2"), the way the
// form's select widget produces it.
impl Serialize for RiskHorizon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RiskHorizon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse(),
            Raw::Number(n) => u8::try_from(n)
                .map_err(|_| BonoError::InvalidHorizon {
                    value: n.to_string(),
                })
                .and_then(RiskHorizon::new),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// Anatomical site a risk percentage refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractureSite {
    Vertebral,
    Hip,
    /// Any major osteoporotic fracture.
    Any,
}

impl FractureSite {
    pub const ALL: [FractureSite; 3] = [FractureSite::Vertebral, FractureSite::Hip, FractureSite::Any];

    pub fn as_str(self) -> &'static str {
        match self {
            FractureSite::Vertebral => "vertebral",
            FractureSite::Hip => "hip",
            FractureSite::Any => "any",
        }
    }

    /// Capitalized label for display.
    pub fn label(self) -> &'static str {
        match self {
            FractureSite::Vertebral => "Vertebral",
            FractureSite::Hip => "Hip",
            FractureSite::Any => "Any",
        }
    }
}

impl fmt::Display for FractureSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FractureSite {
    type Err = BonoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertebral" => Ok(FractureSite::Vertebral),
            "hip" => Ok(FractureSite::Hip),
            "any" => Ok(FractureSite::Any),
            other => Err(BonoError::Config {
                reason: format!("unknown fracture site '{other}'"),
            }),
        }
    }
}

/// Fracture risk percentages per site, exactly as the scoring service
/// returned them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteRisks {
    pub vertebral: f64,
    pub hip: f64,
    pub any: f64,
}

impl SiteRisks {
    pub fn get(&self, site: FractureSite) -> f64 {
        match site {
            FractureSite::Vertebral => self.vertebral,
            FractureSite::Hip => self.hip,
            FractureSite::Any => self.any,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FractureSite, f64)> + '_ {
        FractureSite::ALL.into_iter().map(move |site| (site, self.get(site)))
    }
}

/// The result currently on display. Replaced wholesale on every successful
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub risks: SiteRisks,
    pub horizon: RiskHorizon,
    /// Correlates this result with the request that produced it in logs.
    pub request_id: uuid::Uuid,
    pub received_at: DateTime<Utc>,
}

/// Color-coding bucket for one site's percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intervention category from age-dependent major-osteoporotic-fracture
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MofCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl fmt::Display for MofCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MofCategory::Low => "Low risk",
            MofCategory::Moderate => "Moderate risk",
            MofCategory::High => "High risk",
            MofCategory::VeryHigh => "Very high risk",
        })
    }
}
