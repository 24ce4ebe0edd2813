//! Environmental readings for a city.

use serde::{Deserialize, Serialize};

/// Temperature substituted when the live fetch fails (°C).
pub const FALLBACK_TEMPERATURE_C: f64 = 20.0;

/// Air quality index substituted when the live fetch fails.
pub const FALLBACK_AQI: u8 = 1;

/// Relative humidity substituted when the live fetch fails (%).
pub const FALLBACK_HUMIDITY: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions reported by the environment provider.
///
/// A failed fetch still yields a complete reading: `success` is false and the
/// fallback constants are substituted, so repeated failures are reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    pub success: bool,

    /// Temperature in °C
    pub temperature: Option<f64>,

    /// Air quality index, 1 (good) to 5 (very poor)
    pub aqi: Option<u8>,

    /// Relative humidity in %
    pub humidity: Option<f64>,

    pub city: String,

    pub coordinates: Option<Coordinates>,

    /// Why the live fetch failed, if it did
    pub error: Option<String>,
}

impl EnvironmentReading {
    /// A successful live reading.
    #[must_use]
    pub fn live(
        city: impl Into<String>,
        temperature: f64,
        humidity: f64,
        aqi: u8,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            success: true,
            temperature: Some(temperature),
            aqi: Some(aqi),
            humidity: Some(humidity),
            city: city.into(),
            coordinates: Some(coordinates),
            error: None,
        }
    }

    /// The deterministic reading used when the live fetch fails.
    #[must_use]
    pub fn fallback(city: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            temperature: Some(FALLBACK_TEMPERATURE_C),
            aqi: Some(FALLBACK_AQI),
            humidity: Some(FALLBACK_HUMIDITY),
            city: city.into(),
            coordinates: None,
            error: Some(error.into()),
        }
    }
}
