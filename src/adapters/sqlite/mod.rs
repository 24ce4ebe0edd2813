//! SQLite adapter: Implementation of `AssessmentSink`.
//!
//! Keeps a durable, append-only log of every completed assessment: the
//! inputs, the model outputs, the environment used and the advice given.
//! The core never reads this table back.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex (from a panic
//! in another thread) surfaces as `StorageError::Poisoned`; the assessment
//! that triggered the write still succeeds.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use crate::domain::AssessmentRecord;
use crate::ports::AssessmentSink;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS assessments (
                id TEXT PRIMARY KEY,
                patient_id TEXT,
                patient TEXT NOT NULL,
                city TEXT NOT NULL,
                disease_probability REAL NOT NULL,
                severity REAL NOT NULL,
                base_risk REAL NOT NULL,
                stress_probability REAL NOT NULL,
                total_risk REAL NOT NULL,
                risk_category TEXT NOT NULL,
                environment_live INTEGER NOT NULL,
                temperature REAL,
                aqi INTEGER,
                humidity REAL,
                tags TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assessments_created
                ON assessments(created_at DESC);
            ",
        )?;

        Ok(())
    }

    /// Number of stored assessments.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn count_assessments(&self) -> Result<usize, StorageError> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM assessments", [], |row| row.get(0))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl AssessmentSink for SqliteStorage {
    type Error = StorageError;

    fn record(&self, record: &AssessmentRecord) -> Result<(), Self::Error> {
        let patient = serde_json::to_string(&record.patient)?;
        let tags = serde_json::to_string(&record.tags)?;
        let recommendations = serde_json::to_string(&record.recommendations)?;

        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO assessments (
                id, patient_id, patient, city,
                disease_probability, severity,
                base_risk, stress_probability, total_risk, risk_category,
                environment_live, temperature, aqi, humidity,
                tags, recommendations, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ",
            params![
                record.id,
                record.patient_id,
                patient,
                record.environment.city,
                record.model_outputs.disease_probability,
                record.model_outputs.severity,
                record.risk.base_risk,
                record.risk.stress_probability,
                record.risk.total_risk,
                record.risk.category.label(),
                record.environment.success,
                record.environment.temperature,
                record.environment.aqi,
                record.environment.humidity,
                tags,
                recommendations,
                record.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Saved assessment {} to storage", record.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        sample_record, AssessmentRequest, EnvironmentReading, ModelOutputs, RiskAssessment, Tag,
        TagProfile,
    };

    fn fallback_record() -> AssessmentRecord {
        let request = AssessmentRequest::new(sample_record(), "Atlantis").with_patient_id("p-42");
        let outputs = ModelOutputs::new(0.8, 3.0);
        AssessmentRecord::new(
            &request,
            outputs,
            RiskAssessment::fuse(outputs, 0.0),
            EnvironmentReading::fallback("Atlantis", "city not found"),
            [Tag::HighRisk, Tag::HighBp].into_iter().collect::<TagProfile>(),
            vec!["See a cardiologist".to_string()],
        )
    }

    #[test]
    fn test_record_and_count() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert_eq!(storage.count_assessments().expect("Should count"), 0);

        storage.record(&fallback_record()).expect("Should save");
        storage.record(&fallback_record()).expect("Should save");
        assert_eq!(storage.count_assessments().expect("Should count"), 2);
    }

    #[test]
    fn test_stored_columns() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let record = fallback_record();
        storage.record(&record).expect("Should save");

        let conn = storage.lock().expect("Should lock");
        let (patient_id, category, live, temp, tags): (String, String, bool, f64, String) = conn
            .query_row(
                "SELECT patient_id, risk_category, environment_live, temperature, tags
                 FROM assessments WHERE id = ?1",
                params![record.id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .expect("Should find row");

        assert_eq!(patient_id, "p-42");
        assert_eq!(category, "High Risk");
        assert!(!live);
        assert_eq!(temp, 20.0);
        assert_eq!(tags, r#"["high_risk","high_bp"]"#);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let record = fallback_record();
        storage.record(&record).expect("Should save");
        assert!(matches!(storage.record(&record), Err(StorageError::Database(_))));
    }

    #[test]
    fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("assessments.db");

        SqliteStorage::new(&path)
            .expect("Should open")
            .record(&fallback_record())
            .expect("Should save");

        let reopened = SqliteStorage::new(&path).expect("Should reopen");
        assert_eq!(reopened.count_assessments().expect("Should count"), 1);
    }
}
