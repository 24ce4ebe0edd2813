//! Assessment service: the per-request risk pipeline.
//!
//! This service coordinates:
//! - Patient validation and feature preparation
//! - Classifier and severity regressor evaluation
//! - Environment fetch and stress inference
//! - Risk fusion, tagging and advice selection
//! - Optional persistence of the completed assessment

use std::sync::Arc;

use crate::domain::{
    generate_tags, prepare_features, AssessmentRecord, AssessmentRequest, ModelOutputs,
    PatientRecord, RiskAssessment,
};
use crate::ports::{AssessmentSink, EnvironmentProvider, ModelError};
use crate::{CardioriskError, Result};

use super::EngineContext;

/// Runs assessments against a shared, read-only engine context.
///
/// Cheap to clone; every clone shares the same context, provider and sink.
pub struct AssessmentService<E, S>
where
    E: EnvironmentProvider,
    S: AssessmentSink,
{
    context: Arc<EngineContext>,
    environment: Arc<E>,
    sink: Option<Arc<S>>,
}

impl<E, S> Clone for AssessmentService<E, S>
where
    E: EnvironmentProvider,
    S: AssessmentSink,
{
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            environment: Arc::clone(&self.environment),
            sink: self.sink.clone(),
        }
    }
}

fn model_failure(stage: &str, err: ModelError) -> CardioriskError {
    CardioriskError::ModelUnavailable(format!("{stage}: {err}"))
}

fn finite_output(stage: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(model_failure(stage, ModelError::NonFinite))
    }
}

impl<E, S> AssessmentService<E, S>
where
    E: EnvironmentProvider,
    S: AssessmentSink,
{
    /// Create a service that does not persist assessments.
    pub fn new(context: Arc<EngineContext>, environment: Arc<E>) -> Self {
        Self {
            context,
            environment,
            sink: None,
        }
    }

    /// Persist every completed assessment to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<S>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Evaluate the predictive models for a validated patient.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` if the models are absent or reject the input.
    pub fn predict(&self, patient: &PatientRecord) -> Result<ModelOutputs> {
        let models = self.context.models()?;
        let features = prepare_features(patient, &models.columns, &models.scaler)?;

        let probability = models
            .classifier
            .classify(&features)
            .map_err(|e| model_failure("classifier", e))
            .and_then(|p| finite_output("classifier", p))?;
        let severity = models
            .regressor
            .regress_severity(&features)
            .map_err(|e| model_failure("regressor", e))
            .and_then(|s| finite_output("regressor", s))?;

        Ok(ModelOutputs::new(probability, severity))
    }

    /// Run the full pipeline for one request.
    ///
    /// Environment failures and persistence failures never fail the
    /// assessment: the former fall back to neutral values, the latter are
    /// logged.
    ///
    /// # Errors
    /// Returns `Validation` for out-of-domain patient data and
    /// `ModelUnavailable` if the models cannot be evaluated.
    pub fn assess(&self, request: &AssessmentRequest) -> Result<AssessmentRecord> {
        request
            .patient
            .validate()
            .map_err(CardioriskError::Validation)?;

        tracing::debug!("Step 1: Evaluating predictive models...");
        let outputs = self.predict(&request.patient)?;

        tracing::debug!("Step 2: Fetching environment for {}...", request.city);
        let environment = self.environment.fetch(&request.city);
        let stress = self
            .context
            .stress_model()
            .infer_reading(&environment)
            .map_or(0.0, |inference| inference.probability);

        tracing::debug!("Step 3: Fusing risk...");
        let risk = RiskAssessment::fuse(outputs, stress);

        tracing::debug!("Step 4: Selecting recommendations...");
        let tags = generate_tags(risk.total_risk, &environment, &request.patient);
        let advice = self.context.knowledge_base().recommend(tags);

        let record = AssessmentRecord::new(
            request,
            outputs,
            risk,
            environment,
            advice.generated_tags,
            advice.recommendations,
        );

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.record(&record) {
                tracing::warn!("Failed to persist assessment: {}", e);
            }
        }

        tracing::info!(
            "Assessment complete: risk={:.2}% ({}), stress={:.1}%, live_environment={}, advice={}",
            record.risk.risk_score(),
            record.risk.category,
            record.risk.stress_factor(),
            record.environment.success,
            record.recommendations.len()
        );

        Ok(record)
    }
}
