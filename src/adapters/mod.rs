//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `artifacts`: JSON model artifacts with SHA-256 manifest verification
//! - `openweather`: reqwest client for weather and air quality
//! - `sqlite`: SQLite for assessment history
//! - `sanitize`: secret and identifier filtering for logs

pub mod artifacts;
pub mod openweather;
pub mod sanitize;
pub mod sqlite;
