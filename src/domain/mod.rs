//! Domain layer: Core business types and logic.
//!
//! Everything here is pure: no I/O, no clocks except record timestamps,
//! no network. Collaborators are reached through `crate::ports`.

mod assessment;
mod environment;
mod features;
mod patient;
mod recommendation;
mod risk;
mod stress;

pub use assessment::{AssessmentRecord, AssessmentRequest, AssessmentResponse, EnvironmentSummary};
pub use environment::{
    Coordinates, EnvironmentReading, FALLBACK_AQI, FALLBACK_HUMIDITY, FALLBACK_TEMPERATURE_C,
};
pub use features::{
    encode_record, prepare_features, CanonicalColumns, FeatureVector, ScalerParams,
    CATEGORICAL_FIELDS, NUMERIC_COLUMNS,
};
pub use patient::{
    ChestPainType, ExerciseAngina, FastingBloodSugar, MajorVessels, PatientRecord, RestingEcg,
    Sex, StSlope, Thalassemia,
};
pub use recommendation::{
    generate_tags, AdviceEntry, KnowledgeBase, RecommendationResult, Tag, TagProfile,
};
pub use risk::{ModelOutputs, RiskAssessment, RiskCategory};
pub use stress::{
    ConditionalProbabilityTable, EnvironmentalStressModel, StressEvidence, StressInference,
};

#[cfg(test)]
pub(crate) use features::{training_columns, training_scaler};
#[cfg(test)]
pub(crate) use patient::sample_record;
