//! Risk fusion.
//!
//! Combines the classifier probability and regressor severity into a base
//! clinical risk, then adds the weighted environmental stress.

use serde::{Deserialize, Serialize};

/// Weight of the classifier probability in the base risk.
pub const CLASSIFIER_WEIGHT: f64 = 0.6;

/// Weight of the normalized severity in the base risk.
pub const SEVERITY_WEIGHT: f64 = 0.4;

/// Upper bound of the regressor's severity scale.
pub const MAX_SEVERITY: f64 = 4.0;

/// Weight of the environmental stress probability in the total risk.
pub const STRESS_WEIGHT: f64 = 0.15;

/// Risk category for a fused assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl RiskCategory {
    /// Categorize a total risk fraction. Both boundaries are exclusive.
    #[must_use]
    pub fn from_total_risk(total_risk: f64) -> Self {
        if total_risk > 0.7 {
            Self::HighRisk
        } else if total_risk > 0.3 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Label used in responses and storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::HighRisk => "High Risk",
        }
    }

}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw outputs of the predictive model ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutputs {
    /// Classifier probability of disease (0.0 to 1.0)
    pub disease_probability: f64,

    /// Regressor severity estimate (0.0 to 4.0)
    pub severity: f64,
}

impl ModelOutputs {
    /// Clamp both outputs into their documented ranges.
    #[must_use]
    pub fn new(disease_probability: f64, severity: f64) -> Self {
        Self {
            disease_probability: disease_probability.clamp(0.0, 1.0),
            severity: severity.clamp(0.0, MAX_SEVERITY),
        }
    }

    /// Normalized clinical risk before environmental context.
    #[must_use]
    pub fn base_risk(&self) -> f64 {
        self.disease_probability * CLASSIFIER_WEIGHT
            + (self.severity / MAX_SEVERITY) * SEVERITY_WEIGHT
    }
}

/// Fused risk for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub base_risk: f64,
    pub stress_probability: f64,
    pub total_risk: f64,
    pub category: RiskCategory,
}

impl RiskAssessment {
    /// Fuse model outputs with the environmental stress probability.
    #[must_use]
    pub fn fuse(outputs: ModelOutputs, stress_probability: f64) -> Self {
        let base_risk = outputs.base_risk();
        let stress_probability = stress_probability.clamp(0.0, 1.0);
        let total_risk = (base_risk + stress_probability * STRESS_WEIGHT).clamp(0.0, 1.0);

        Self {
            base_risk,
            stress_probability,
            total_risk,
            category: RiskCategory::from_total_risk(total_risk),
        }
    }

    /// Total risk as a percentage rounded to 2 decimals.
    #[must_use]
    pub fn risk_score(&self) -> f64 {
        round_to(self.total_risk * 100.0, 2)
    }

    /// Stress probability as a percentage rounded to 1 decimal.
    #[must_use]
    pub fn stress_factor(&self) -> f64 {
        round_to(self.stress_probability * 100.0, 1)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
