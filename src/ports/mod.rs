//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the assessment pipeline and the outside world (model artifacts,
//! the weather service, durable storage).

mod environment;
mod model;
mod storage;

pub use environment::EnvironmentProvider;
pub use model::{Classifier, ModelArtifacts, ModelError, SeverityRegressor};
pub use storage::AssessmentSink;
