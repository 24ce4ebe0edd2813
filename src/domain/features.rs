//! Feature preparation: patient record to model input vector.
//!
//! Categorical fields are one-hot encoded as `<field>_<code>` columns, the
//! result is reindexed against the canonical column list fixed at training
//! time, and the numeric columns are standardized with the persisted scaler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::patient::PatientRecord;
use crate::CardioriskError;

/// Numeric columns standardized by the scaler, in scaler order.
pub const NUMERIC_COLUMNS: [&str; 5] = ["age", "trestbps", "chol", "thalach", "oldpeak"];

/// Categorical fields expanded into one-hot columns.
pub const CATEGORICAL_FIELDS: [&str; 4] = ["cp", "restecg", "slope", "thal"];

/// Ordered feature names the predictive models were trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CanonicalColumns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl CanonicalColumns {
    /// Build a column list, rejecting empty lists and duplicate names.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("canonical column list is empty".to_string());
        }

        let mut index = HashMap::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            if index.insert(name.clone(), pos).is_some() {
                return Err(format!("duplicate canonical column '{name}'"));
            }
        }

        Ok(Self { names, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a column, if the models know it.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

}

impl TryFrom<Vec<String>> for CanonicalColumns {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<CanonicalColumns> for Vec<String> {
    fn from(columns: CanonicalColumns) -> Self {
        columns.names
    }
}

/// Persisted standardization parameters for the numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerParams {
    /// Check shape and that every numeric column has parameters.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.columns.len() || self.scale.len() != self.columns.len() {
            return Err(format!(
                "scaler has {} columns but {} means and {} scales",
                self.columns.len(),
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(missing) = NUMERIC_COLUMNS
            .iter()
            .find(|c| !self.columns.iter().any(|s| s == *c))
        {
            return Err(format!("scaler has no parameters for '{missing}'"));
        }
        if self
            .mean
            .iter()
            .chain(self.scale.iter())
            .any(|v| !v.is_finite())
        {
            return Err("scaler parameters must be finite".to_string());
        }
        Ok(())
    }

    /// Standardize `value` for `column`. A zero scale is treated as 1.0.
    ///
    /// `None` when the column has no parameters, including when `mean` or
    /// `scale` is shorter than `columns`.
    #[must_use]
    pub fn standardize(&self, column: &str, value: f64) -> Option<f64> {
        let pos = self.columns.iter().position(|c| c == column)?;
        let mean = *self.mean.get(pos)?;
        let scale = match *self.scale.get(pos)? {
            s if s == 0.0 => 1.0,
            s => s,
        };
        Some((value - mean) / scale)
    }
}

/// Model input aligned to the canonical column list.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Encode a record into named columns before reindexing.
///
/// Passthrough fields keep their raw value or code; each categorical field
/// contributes exactly one `<field>_<code>` column set to 1.0.
#[must_use]
pub fn encode_record(record: &PatientRecord) -> Vec<(String, f64)> {
    let passthrough = [
        ("age", record.age),
        ("sex", f64::from(record.sex.code())),
        ("trestbps", record.resting_bp),
        ("chol", record.cholesterol),
        ("fbs", f64::from(record.fasting_blood_sugar.code())),
        ("thalach", record.max_heart_rate),
        ("exang", f64::from(record.exercise_angina.code())),
        ("oldpeak", record.st_depression),
        ("ca", f64::from(record.major_vessels.code())),
    ];
    let categorical_codes = [
        record.chest_pain.code(),
        record.resting_ecg.code(),
        record.st_slope.code(),
        record.thalassemia.code(),
    ];

    passthrough
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .chain(
            CATEGORICAL_FIELDS
                .into_iter()
                .zip(categorical_codes)
                .map(|(field, code)| (format!("{field}_{code}"), 1.0)),
        )
        .collect()
}

/// Prepare the feature vector consumed by the predictive models.
///
/// Encoded columns unknown to the canonical list are dropped; canonical
/// columns this record does not produce are zero-filled.
///
/// # Errors
/// Returns `ModelUnavailable` if a numeric column is missing from the
/// canonical list or from the scaler parameters.
pub fn prepare_features(
    record: &PatientRecord,
    columns: &CanonicalColumns,
    scaler: &ScalerParams,
) -> Result<FeatureVector, CardioriskError> {
    if columns.is_empty() {
        return Err(CardioriskError::ModelUnavailable(
            "canonical column list is empty".to_string(),
        ));
    }

    let mut values = vec![0.0; columns.len()];
    for (name, value) in encode_record(record) {
        match columns.position(&name) {
            Some(pos) => values[pos] = value,
            None => tracing::trace!("Column {} not used by the models", name),
        }
    }

    for column in NUMERIC_COLUMNS {
        let pos = columns.position(column).ok_or_else(|| {
            CardioriskError::ModelUnavailable(format!(
                "numeric column '{column}' missing from canonical columns"
            ))
        })?;
        values[pos] = scaler.standardize(column, values[pos]).ok_or_else(|| {
            CardioriskError::ModelUnavailable(format!("no scaler parameters for '{column}'"))
        })?;
    }

    Ok(FeatureVector { values })
}

/// Columns as produced by drop-first encoding at training time.
#[cfg(test)]
pub(crate) fn training_columns() -> CanonicalColumns {
    let names = [
        "age", "sex", "trestbps", "chol", "fbs", "thalach", "exang", "oldpeak", "ca", "cp_1",
        "cp_2", "cp_3", "restecg_1", "restecg_2", "slope_1", "slope_2", "thal_1", "thal_2",
        "thal_3",
    ];
    CanonicalColumns::new(names.iter().map(|s| s.to_string()).collect())
        .expect("Valid columns")
}

#[cfg(test)]
pub(crate) fn training_scaler() -> ScalerParams {
    ScalerParams {
        columns: NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect(),
        mean: vec![54.0, 130.0, 240.0, 150.0, 1.0],
        scale: vec![9.0, 17.5, 50.0, 23.0, 1.25],
    }
}
