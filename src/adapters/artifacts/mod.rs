//! Model artifact adapter: loads the predictive models from JSON exports.
//!
//! A model directory holds four artifacts produced by the training pipeline:
//! - `classifier.json`: logistic model over the canonical columns
//! - `regressor.json`: linear severity model over the canonical columns
//! - `columns.json`: the canonical column list
//! - `scaler.json`: standardization parameters for the numeric columns
//!
//! # Integrity
//!
//! When a `manifest.json` is present, every artifact must be bound by it with
//! a matching SHA-256 digest. Without a manifest the artifacts are loaded as
//! found, with a warning.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{CanonicalColumns, FeatureVector, ScalerParams};
use crate::ports::{Classifier, ModelArtifacts, ModelError, SeverityRegressor};

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const REGRESSOR_FILE: &str = "regressor.json";
pub const COLUMNS_FILE: &str = "columns.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Every artifact a manifest must bind.
pub const ARTIFACT_FILES: [&str; 4] = [CLASSIFIER_FILE, REGRESSOR_FILE, COLUMNS_FILE, SCALER_FILE];

const MANIFEST_VERSION: u32 = 1;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid {file}: {message}")]
    Format { file: &'static str, message: String },

    #[error("Manifest does not bind {0}")]
    Unbound(&'static str),

    #[error("Digest mismatch for {0}")]
    DigestMismatch(String),
}

/// Linear model as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelExport {
    /// Weight per canonical column; missing columns weigh zero
    pub coefficients: BTreeMap<String, f64>,
    pub intercept: f64,
}

/// Manifest binding artifact files to SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Build a manifest over the artifacts in `dir`.
    ///
    /// # Errors
    /// Returns error if an artifact cannot be read.
    pub fn for_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let files = ARTIFACT_FILES
            .iter()
            .map(|name| -> Result<(String, String), ArtifactError> {
                let digest = sha256_hex(&read_bytes(&dir.join(name))?);
                Ok((name.to_string(), digest))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }
}

/// Weights resolved against the canonical column order.
#[derive(Debug, Clone)]
struct LinearModel {
    weights: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    fn resolve(
        file: &'static str,
        export: LinearModelExport,
        columns: &CanonicalColumns,
    ) -> Result<Self, ArtifactError> {
        let mut weights = vec![0.0; columns.len()];
        for (name, weight) in export.coefficients {
            let pos = columns.position(&name).ok_or_else(|| ArtifactError::Format {
                file,
                message: format!("coefficient for unknown column '{name}'"),
            })?;
            if !weight.is_finite() {
                return Err(ArtifactError::Format {
                    file,
                    message: format!("non-finite coefficient for '{name}'"),
                });
            }
            weights[pos] = weight;
        }
        if !export.intercept.is_finite() {
            return Err(ArtifactError::Format {
                file,
                message: "non-finite intercept".to_string(),
            });
        }
        Ok(Self {
            weights,
            intercept: export.intercept,
        })
    }

    fn decision(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if features.len() != self.weights.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }
        let z = self
            .weights
            .iter()
            .zip(features.as_slice())
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        if z.is_finite() {
            Ok(z)
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

/// Logistic regression classifier.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    model: LinearModel,
}

impl Classifier for LogisticClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let z = self.model.decision(features)?;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Linear severity regressor, clamped to the 0 to 4 scale.
#[derive(Debug, Clone)]
pub struct LinearSeverityRegressor {
    model: LinearModel,
}

impl SeverityRegressor for LinearSeverityRegressor {
    fn regress_severity(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.model.decision(features)?.clamp(0.0, 4.0))
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: serde::de::DeserializeOwned>(
    file: &'static str,
    bytes: &[u8],
) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|e| ArtifactError::Format {
        file,
        message: e.to_string(),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Load and verify the model artifacts in `dir`.
///
/// # Errors
/// Returns error if an artifact is missing, malformed, inconsistent with the
/// canonical columns, or fails manifest verification.
pub fn load_model_dir(dir: &Path) -> Result<ModelArtifacts, ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest: Option<ArtifactManifest> = if manifest_path.exists() {
        let manifest: ArtifactManifest = parse(MANIFEST_FILE, &read_bytes(&manifest_path)?)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Format {
                file: MANIFEST_FILE,
                message: format!("unsupported version {}", manifest.version),
            });
        }
        Some(manifest)
    } else {
        tracing::warn!(
            "No {} in {:?}; loading artifacts without integrity check",
            MANIFEST_FILE,
            dir
        );
        None
    };

    let read_verified = |file: &'static str| -> Result<Vec<u8>, ArtifactError> {
        let bytes = read_bytes(&dir.join(file))?;
        if let Some(manifest) = &manifest {
            let expected = manifest.files.get(file).ok_or(ArtifactError::Unbound(file))?;
            if !sha256_hex(&bytes).eq_ignore_ascii_case(expected) {
                return Err(ArtifactError::DigestMismatch(file.to_string()));
            }
        }
        Ok(bytes)
    };

    let columns: CanonicalColumns = parse(COLUMNS_FILE, &read_verified(COLUMNS_FILE)?)?;

    let scaler: ScalerParams = parse(SCALER_FILE, &read_verified(SCALER_FILE)?)?;
    scaler.validate().map_err(|message| ArtifactError::Format {
        file: SCALER_FILE,
        message,
    })?;

    let classifier: LinearModelExport = parse(CLASSIFIER_FILE, &read_verified(CLASSIFIER_FILE)?)?;
    let regressor: LinearModelExport = parse(REGRESSOR_FILE, &read_verified(REGRESSOR_FILE)?)?;

    let classifier = LogisticClassifier {
        model: LinearModel::resolve(CLASSIFIER_FILE, classifier, &columns)?,
    };
    let regressor = LinearSeverityRegressor {
        model: LinearModel::resolve(REGRESSOR_FILE, regressor, &columns)?,
    };

    tracing::info!(
        "Loaded model artifacts from {:?} ({} canonical columns, verified={})",
        dir,
        columns.len(),
        manifest.is_some()
    );

    Ok(ModelArtifacts {
        columns,
        scaler,
        classifier: Box::new(classifier),
        regressor: Box::new(regressor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prepare_features, sample_record, training_columns, training_scaler};

    fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) {
        let bytes = serde_json::to_vec_pretty(value).expect("Should serialize");
        fs::write(dir.join(file), bytes).expect("Should write");
    }

    fn write_artifacts(dir: &Path) {
        write_json(dir, COLUMNS_FILE, &training_columns());
        write_json(dir, SCALER_FILE, &training_scaler());
        write_json(
            dir,
            CLASSIFIER_FILE,
            &LinearModelExport {
                coefficients: BTreeMap::from([
                    ("age".to_string(), 0.5),
                    ("ca".to_string(), 0.8),
                    ("thal_2".to_string(), 0.4),
                ]),
                intercept: -0.7,
            },
        );
        write_json(
            dir,
            REGRESSOR_FILE,
            &LinearModelExport {
                coefficients: BTreeMap::from([("oldpeak".to_string(), 0.9)]),
                intercept: 1.0,
            },
        );
    }

    #[test]
    fn test_load_and_evaluate() {
        let dir = tempfile::tempdir().expect("Temp dir");
        write_artifacts(dir.path());

        let artifacts = load_model_dir(dir.path()).expect("Should load");
        let features = prepare_features(&sample_record(), &artifacts.columns, &artifacts.scaler)
            .expect("Should prepare");

        // z = -0.7 + 0.5 * (11 / 9) + 0.8 * 1 + 0.4 * 1
        let z: f64 = -0.7 + 0.5 * (11.0 / 9.0) + 0.8 + 0.4;
        let p = artifacts.classifier.classify(&features).expect("Should classify");
        assert!((p - 1.0 / (1.0 + (-z).exp())).abs() < 1e-12);

        // 1.0 + 0.9 * 1.2
        let severity = artifacts
            .regressor
            .regress_severity(&features)
            .expect("Should regress");
        assert!((severity - 2.08).abs() < 1e-12);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().expect("Temp dir");
        write_artifacts(dir.path());
        fs::remove_file(dir.path().join(REGRESSOR_FILE)).expect("Should remove");

        let err = load_model_dir(dir.path()).expect_err("Should fail");
        assert!(matches!(err, ArtifactError::Read { .. }));
    }

    #[test]
    fn test_unknown_coefficient_column() {
        let dir = tempfile::tempdir().expect("Temp dir");
        write_artifacts(dir.path());
        write_json(
            dir.path(),
            CLASSIFIER_FILE,
            &LinearModelExport {
                coefficients: BTreeMap::from([("cp_0".to_string(), 1.0)]),
                intercept: 0.0,
            },
        );

        let err = load_model_dir(dir.path()).expect_err("Should fail");
        assert!(matches!(err, ArtifactError::Format { file: CLASSIFIER_FILE, .. }));
    }

    #[test]
    fn test_manifest_verification() {
        let dir = tempfile::tempdir().expect("Temp dir");
        write_artifacts(dir.path());
        let manifest = ArtifactManifest::for_dir(dir.path()).expect("Should hash");
        write_json(dir.path(), MANIFEST_FILE, &manifest);

        assert!(load_model_dir(dir.path()).is_ok());

        // Tamper with a bound artifact.
        let mut scaler = training_scaler();
        scaler.mean[0] = 10.0;
        write_json(dir.path(), SCALER_FILE, &scaler);

        let err = load_model_dir(dir.path()).expect_err("Should fail");
        assert!(matches!(err, ArtifactError::DigestMismatch(ref f) if f == SCALER_FILE));
    }

    #[test]
    fn test_manifest_must_bind_every_artifact() {
        let dir = tempfile::tempdir().expect("Temp dir");
        write_artifacts(dir.path());
        let mut manifest = ArtifactManifest::for_dir(dir.path()).expect("Should hash");
        manifest.files.remove(COLUMNS_FILE);
        write_json(dir.path(), MANIFEST_FILE, &manifest);

        let err = load_model_dir(dir.path()).expect_err("Should fail");
        assert!(matches!(err, ArtifactError::Unbound(COLUMNS_FILE)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let columns = training_columns();
        let classifier = LogisticClassifier {
            model: LinearModel::resolve(
                CLASSIFIER_FILE,
                LinearModelExport {
                    coefficients: BTreeMap::new(),
                    intercept: 0.0,
                },
                &columns,
            )
            .expect("Should resolve"),
        };
        let numeric_only = crate::domain::NUMERIC_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        let other = CanonicalColumns::new(numeric_only).expect("Valid columns");
        let features =
            prepare_features(&sample_record(), &other, &training_scaler()).expect("Should prepare");

        let err = classifier.classify(&features).expect_err("Should fail");
        assert!(matches!(err, ModelError::DimensionMismatch { expected: 19, actual: 5 }));
    }

    #[test]
    fn test_bundled_models_load() {
        let artifacts = load_model_dir(Path::new("models")).expect("Bundled models should load");
        let features = prepare_features(&sample_record(), &artifacts.columns, &artifacts.scaler)
            .expect("Should prepare");
        let p = artifacts.classifier.classify(&features).expect("Should classify");
        assert!((0.0..=1.0).contains(&p));
    }
}
