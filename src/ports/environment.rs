//! Environment provider port: current conditions for a city.

use crate::domain::EnvironmentReading;

/// Source of live environmental context.
///
/// Implementations must bound every network call with a timeout and must
/// never fail: on any error they return `EnvironmentReading::fallback`.
pub trait EnvironmentProvider: Send + Sync {
    /// Fetch temperature, humidity and air quality for `city`.
    fn fetch(&self, city: &str) -> EnvironmentReading;
}
