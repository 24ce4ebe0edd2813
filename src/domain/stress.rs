//! Environmental stress inference.
//!
//! A discrete probabilistic model over two boolean evidence variables:
//! P(cardiac stress | heatwave, pollution), read from a fixed conditional
//! probability table.

use serde::Serialize;

use super::environment::EnvironmentReading;

/// Temperatures strictly above this are a heatwave (°C).
pub const HEATWAVE_THRESHOLD_C: f64 = 30.0;

/// AQI values strictly above this count as polluted.
pub const POLLUTION_THRESHOLD_AQI: u8 = 3;

/// Discretized environmental evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StressEvidence {
    pub is_heatwave: bool,
    pub is_polluted: bool,
}

impl StressEvidence {
    #[must_use]
    pub fn from_conditions(temperature: f64, aqi: u8) -> Self {
        Self {
            is_heatwave: temperature > HEATWAVE_THRESHOLD_C,
            is_polluted: aqi > POLLUTION_THRESHOLD_AQI,
        }
    }
}

/// Stress probability for every combination of the two evidence variables.
///
/// One field per row keeps the table exhaustive by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalProbabilityTable {
    heatwave_and_polluted: f64,
    heatwave_only: f64,
    polluted_only: f64,
    neither: f64,
}

impl ConditionalProbabilityTable {
    #[must_use]
    pub fn probability(&self, evidence: StressEvidence) -> f64 {
        match (evidence.is_heatwave, evidence.is_polluted) {
            (true, true) => self.heatwave_and_polluted,
            (true, false) => self.heatwave_only,
            (false, true) => self.polluted_only,
            (false, false) => self.neither,
        }
    }
}

impl Default for ConditionalProbabilityTable {
    fn default() -> Self {
        Self {
            heatwave_and_polluted: 0.95,
            heatwave_only: 0.75,
            polluted_only: 0.65,
            neither: 0.10,
        }
    }
}

/// Result of one inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressInference {
    pub probability: f64,
    pub evidence: StressEvidence,
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentalStressModel {
    table: ConditionalProbabilityTable,
}

impl EnvironmentalStressModel {
    #[must_use]
    pub fn infer(&self, temperature: f64, aqi: u8) -> StressInference {
        let evidence = StressEvidence::from_conditions(temperature, aqi);
        StressInference {
            probability: self.table.probability(evidence),
            evidence,
        }
    }

    /// Inference for a reading, or `None` when it must not contribute.
    ///
    /// Failed fetches carry guessed values and never inflate risk; the same
    /// holds for a successful reading that lacks temperature or AQI.
    #[must_use]
    pub fn infer_reading(&self, reading: &EnvironmentReading) -> Option<StressInference> {
        if !reading.success {
            return None;
        }
        Some(self.infer(reading.temperature?, reading.aqi?))
    }
}
