//! Predictive model port: classifier and severity regressor.
//!
//! This trait pair abstracts the pretrained models from the pipeline. Both
//! are loaded once at startup, together with the feature layout they expect.

use crate::domain::{CanonicalColumns, FeatureVector, ScalerParams};

/// Errors raised while evaluating a loaded model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model produced a non-finite output")]
    NonFinite,
}

/// Binary disease classifier.
pub trait Classifier: Send + Sync {
    /// Probability of disease, in [0, 1].
    ///
    /// # Errors
    /// Returns `ModelError` if the vector does not fit the model.
    fn classify(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// Disease severity regressor.
pub trait SeverityRegressor: Send + Sync {
    /// Severity estimate on the 0 to 4 scale.
    ///
    /// # Errors
    /// Returns `ModelError` if the vector does not fit the model.
    fn regress_severity(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// The four artifacts an assessment needs, loaded together.
pub struct ModelArtifacts {
    pub columns: CanonicalColumns,
    pub scaler: ScalerParams,
    pub classifier: Box<dyn Classifier>,
    pub regressor: Box<dyn SeverityRegressor>,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("columns", &self.columns.len())
            .field("scaler", &self.scaler.columns)
            .finish_non_exhaustive()
    }
}
