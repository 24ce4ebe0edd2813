//! Storage port: write-only persistence of assessments.
//!
//! The assessment pipeline emits records and never reads them back.

use crate::domain::AssessmentRecord;

/// Durable sink for completed assessments.
pub trait AssessmentSink: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist one assessment with all of its inputs and outputs.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    fn record(&self, record: &AssessmentRecord) -> Result<(), Self::Error>;
}
