//! Engine context: everything an assessment reads, built once at startup.

use std::path::Path;

use crate::adapters::artifacts;
use crate::config::Settings;
use crate::domain::{EnvironmentalStressModel, KnowledgeBase};
use crate::ports::ModelArtifacts;
use crate::{CardioriskError, Result};

/// Immutable startup state shared by every assessment.
///
/// Missing model artifacts do not prevent construction; each assessment then
/// fails with `ModelUnavailable` instead.
#[derive(Debug)]
pub struct EngineContext {
    models: std::result::Result<ModelArtifacts, String>,
    stress_model: EnvironmentalStressModel,
    knowledge_base: KnowledgeBase,
}

impl EngineContext {
    #[must_use]
    pub fn new(
        models: ModelArtifacts,
        stress_model: EnvironmentalStressModel,
        knowledge_base: KnowledgeBase,
    ) -> Self {
        Self {
            models: Ok(models),
            stress_model,
            knowledge_base,
        }
    }

    /// A context whose models could not be loaded.
    #[must_use]
    pub fn without_models(
        reason: impl Into<String>,
        stress_model: EnvironmentalStressModel,
        knowledge_base: KnowledgeBase,
    ) -> Self {
        Self {
            models: Err(reason.into()),
            stress_model,
            knowledge_base,
        }
    }

    /// Load models and knowledge base from disk.
    ///
    /// Artifact failures are logged and recorded; they never fail the load.
    #[must_use]
    pub fn load(model_dir: &Path, advice_db: &Path) -> Self {
        let knowledge_base = KnowledgeBase::load(advice_db);
        let stress_model = EnvironmentalStressModel::default();

        match artifacts::load_model_dir(model_dir) {
            Ok(models) => Self::new(models, stress_model, knowledge_base),
            Err(e) => {
                tracing::error!("Model artifacts unavailable: {}", e);
                Self::without_models(e.to_string(), stress_model, knowledge_base)
            }
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::load(&settings.model_dir, &settings.advice_db)
    }

    /// The loaded models.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` with the load failure if artifacts are absent.
    pub fn models(&self) -> Result<&ModelArtifacts> {
        self.models
            .as_ref()
            .map_err(|reason| CardioriskError::ModelUnavailable(reason.clone()))
    }

    #[must_use]
    pub fn models_available(&self) -> bool {
        self.models.is_ok()
    }

    #[must_use]
    pub fn stress_model(&self) -> &EnvironmentalStressModel {
        &self.stress_model
    }

    #[must_use]
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }
}
