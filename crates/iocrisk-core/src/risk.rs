//! Severity bands for numeric risk scores.

use serde::{Deserialize, Serialize};

/// Discrete severity derived from a 0–100 risk score.
///
/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    /// 0–14
    Minimal,
    /// 15–39
    Low,
    /// 40–69
    Moderate,
    /// 70 and above
    High,
}

impl RiskBand {
    /// Semantic colour tag for renderers.
    pub fn color_tag(self) -> &'static str {
        match self {
            Self::Minimal => "green",
            Self::Low => "yellow",
            Self::Moderate => "orange",
            Self::High => "red",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Minimal => "🟢",
            Self::Low => "🟡",
            Self::Moderate => "🟠",
            Self::High => "🔴",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "Minimal"),
            Self::Low => write!(f, "Low"),
            Self::Moderate => write!(f, "Moderate"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Band plus its presentation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskClass {
    pub band: RiskBand,
    pub color_tag: &'static str,
    pub icon: &'static str,
}

/// Classify a score. Thresholds are evaluated high to low.
///
/// Range checking is the caller's job; anything below 15 (including NaN)
/// lands in `Minimal`.
pub fn classify(score: f64) -> RiskClass {
    let band = if score >= 70.0 {
        RiskBand::High
    } else if score >= 40.0 {
        RiskBand::Moderate
    } else if score >= 15.0 {
        RiskBand::Low
    } else {
        RiskBand::Minimal
    };
    RiskClass {
        band,
        color_tag: band.color_tag(),
        icon: band.icon(),
    }
}
