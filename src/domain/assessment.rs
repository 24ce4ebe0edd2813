//! Assessment request, response and the persisted record.

use serde::{Deserialize, Serialize};

use super::environment::EnvironmentReading;
use super::patient::PatientRecord;
use super::recommendation::TagProfile;
use super::risk::{ModelOutputs, RiskAssessment, RiskCategory};

/// Input to one assessment: a patient and the city they are in.
///
/// Serialized with the patient fields flattened alongside `city`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    /// Caller-side patient reference, stored with the record only
    #[serde(default)]
    pub patient_id: Option<String>,

    #[serde(flatten)]
    pub patient: PatientRecord,

    pub city: String,
}

impl AssessmentRequest {
    #[must_use]
    pub fn new(patient: PatientRecord, city: impl Into<String>) -> Self {
        Self {
            patient_id: None,
            patient,
            city: city.into(),
        }
    }

    #[must_use]
    pub fn with_patient_id(mut self, id: impl Into<String>) -> Self {
        self.patient_id = Some(id.into());
        self
    }
}

/// Environment block of the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSummary {
    pub city: String,
    pub temp: Option<f64>,
    pub aqi: Option<u8>,
    pub stress_factor: f64,
}

/// Response returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    /// Total risk in percent, 2 decimals
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub environment: EnvironmentSummary,
    pub recommendations: Vec<String>,
}

/// Everything an assessment consumed and produced, for durable storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: String,
    pub patient_id: Option<String>,
    pub patient: PatientRecord,
    pub model_outputs: ModelOutputs,
    pub risk: RiskAssessment,
    pub environment: EnvironmentReading,
    pub tags: TagProfile,
    pub recommendations: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl AssessmentRecord {
    #[must_use]
    pub fn new(
        request: &AssessmentRequest,
        model_outputs: ModelOutputs,
        risk: RiskAssessment,
        environment: EnvironmentReading,
        tags: TagProfile,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            patient_id: request.patient_id.clone(),
            patient: request.patient.clone(),
            model_outputs,
            risk,
            environment,
            tags,
            recommendations,
            created_at: chrono::Utc::now(),
        }
    }

    /// The caller-facing view of this record.
    #[must_use]
    pub fn response(&self) -> AssessmentResponse {
        AssessmentResponse {
            risk_score: self.risk.risk_score(),
            risk_category: self.risk.category,
            environment: EnvironmentSummary {
                city: self.environment.city.clone(),
                temp: self.environment.temperature,
                aqi: self.environment.aqi,
                stress_factor: self.risk.stress_factor(),
            },
            recommendations: self.recommendations.clone(),
        }
    }
}

/// Generate a random UUID v4 from a ChaCha20 CSPRNG seeded by the OS.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::sample_record;

    #[test]
    fn test_request_accepts_flattened_fields() {
        let json = r#"{
            "age": 65, "sex": 1, "cp": 0, "trestbps": 150, "chol": 260, "fbs": 1,
            "restecg": 0, "thalach": 145, "exang": 1, "oldpeak": 2.5, "slope": 1,
            "ca": 1, "thal": 2, "city": "London"
        }"#;
        let request: AssessmentRequest = serde_json::from_str(json).expect("Should parse");
        assert_eq!(request, AssessmentRequest::new(sample_record(), "London"));
    }

    #[test]
    fn test_response_from_fallback_record() {
        let request = AssessmentRequest::new(sample_record(), "Nowhere").with_patient_id("p-1");
        let risk = RiskAssessment::fuse(ModelOutputs::new(0.8, 3.0), 0.0);
        let record = AssessmentRecord::new(
            &request,
            ModelOutputs::new(0.8, 3.0),
            risk,
            EnvironmentReading::fallback("Nowhere", "city not found"),
            TagProfile::default(),
            vec![],
        );

        let response = record.response();
        assert_eq!(response.risk_score, 78.0);
        assert_eq!(response.risk_category, RiskCategory::HighRisk);
        assert_eq!(response.environment.temp, Some(20.0));
        assert_eq!(response.environment.aqi, Some(1));
        assert_eq!(response.environment.stress_factor, 0.0);
        assert_eq!(record.patient_id.as_deref(), Some("p-1"));

        let json = serde_json::to_value(&response).expect("Should serialize");
        assert_eq!(json["risk_category"], "High Risk");
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
        assert_eq!(&id1[14..15], "4");
    }
}
