//! # Cardiorisk
//!
//! Cardiac risk fusion and recommendation engine.
//!
//! This crate provides:
//! - Feature preparation for pretrained cardiac risk models
//! - Environmental stress inference from live weather and air quality
//! - Weighted fusion of clinical and environmental risk
//! - Tag-driven advice recommendations from a static knowledge base
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types and pure computations
//! - `ports`: Trait definitions for external collaborators
//! - `adapters`: Concrete implementations (model artifacts, OpenWeather, SQLite)
//! - `application`: The engine context and the assessment use case
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{AssessmentResponse, PatientRecord, RiskAssessment, RiskCategory, Tag};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Invalid patient data: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Predictive models unavailable: {0}")]
    ModelUnavailable(String),
}
