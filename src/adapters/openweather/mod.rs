//! OpenWeather adapter: Implementation of `EnvironmentProvider`.
//!
//! Two blocking calls per fetch: current weather by city name (temperature,
//! humidity, coordinates), then air pollution at those coordinates (AQI).
//! Any failure yields `EnvironmentReading::fallback` and a warning.
//!
//! The API key travels only in query strings. Request URLs are stripped from
//! transport errors before they are stored or logged.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::domain::{Coordinates, EnvironmentReading};
use crate::ports::EnvironmentProvider;

pub const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const AIR_POLLUTION_URL: &str = "https://api.openweathermap.org/data/2.5/air_pollution";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Why a live fetch failed. Never escapes the adapter.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("Weather API key is not configured")]
    MissingApiKey,

    #[error("Live environment data disabled")]
    Offline,

    #[error("HTTP client unavailable: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Unexpected {endpoint} payload: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    #[error("AQI {0} outside 1..=5")]
    AqiOutOfRange(i64),
}

impl FetchError {
    fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    coord: CoordBlock,
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct CoordBlock {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct PollutionPayload {
    list: Vec<PollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct PollutionEntry {
    main: AqiBlock,
}

#[derive(Debug, Deserialize)]
struct AqiBlock {
    aqi: i64,
}

/// Combine the two payloads into a live reading.
fn reading_from(
    city: &str,
    weather: WeatherPayload,
    pollution: PollutionPayload,
) -> Result<EnvironmentReading, FetchError> {
    let raw_aqi = pollution
        .list
        .first()
        .map(|entry| entry.main.aqi)
        .ok_or_else(|| FetchError::Decode {
            endpoint: "air_pollution",
            message: "empty list".to_string(),
        })?;
    let aqi = u8::try_from(raw_aqi)
        .ok()
        .filter(|a| (1..=5).contains(a))
        .ok_or(FetchError::AqiOutOfRange(raw_aqi))?;

    Ok(EnvironmentReading::live(
        city,
        weather.main.temp,
        weather.main.humidity,
        aqi,
        Coordinates {
            lat: weather.coord.lat,
            lon: weather.coord.lon,
        },
    ))
}

enum Transport {
    Live(Client),
    Offline,
    Unavailable(String),
}

/// Blocking OpenWeather client with timeout and bounded retries.
pub struct OpenWeatherClient {
    transport: Transport,
    api_key: Option<String>,
    weather_url: String,
    pollution_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("weather_url", &self.weather_url)
            .field("pollution_url", &self.pollution_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherClient {
    /// Create a client. An empty key is treated as missing.
    #[must_use]
    pub fn new(api_key: Option<String>, timeout: Duration, max_retries: u32) -> Self {
        let transport = match Client::builder().timeout(timeout).build() {
            Ok(client) => Transport::Live(client),
            Err(e) => Transport::Unavailable(e.without_url().to_string()),
        };

        Self {
            transport,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            weather_url: WEATHER_URL.to_string(),
            pollution_url: AIR_POLLUTION_URL.to_string(),
            max_retries,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// A client that never touches the network and always falls back.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            transport: Transport::Offline,
            api_key: None,
            weather_url: WEATHER_URL.to_string(),
            pollution_url: AIR_POLLUTION_URL.to_string(),
            max_retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Point the client at different endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        weather_url: impl Into<String>,
        pollution_url: impl Into<String>,
    ) -> Self {
        self.weather_url = weather_url.into();
        self.pollution_url = pollution_url.into();
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn try_fetch(&self, city: &str) -> Result<EnvironmentReading, FetchError> {
        let http = match &self.transport {
            Transport::Live(client) => client,
            Transport::Offline => return Err(FetchError::Offline),
            Transport::Unavailable(reason) => return Err(FetchError::Client(reason.clone())),
        };
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let weather: WeatherPayload = self.get_json("weather", || {
            http.get(&self.weather_url)
                .query(&[("q", city), ("appid", api_key), ("units", "metric")])
                .send()
        })?;

        let lat = weather.coord.lat.to_string();
        let lon = weather.coord.lon.to_string();
        let pollution: PollutionPayload = self.get_json("air_pollution", || {
            http.get(&self.pollution_url)
                .query(&[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", api_key)])
                .send()
        })?;

        reading_from(city, weather, pollution)
    }

    /// Send with retries on transport failures and 5xx, then decode.
    fn get_json<T, F>(&self, endpoint: &'static str, send: F) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> reqwest::Result<Response>,
    {
        let mut attempt = 0;
        let response = loop {
            let retries_left = attempt < self.max_retries;
            match send() {
                Ok(resp) if resp.status().is_server_error() && retries_left => {
                    tracing::debug!(endpoint, status = %resp.status(), attempt, "Retrying");
                }
                Ok(resp) if resp.status().is_success() => break resp,
                Ok(resp) => {
                    return Err(FetchError::Status {
                        endpoint,
                        status: resp.status(),
                    })
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && retries_left => {
                    tracing::debug!(endpoint, attempt, "Retrying after transport error");
                }
                Err(e) => return Err(FetchError::transport(e)),
            }
            attempt += 1;
            std::thread::sleep(self.retry_backoff);
        };

        response.json::<T>().map_err(|e| FetchError::Decode {
            endpoint,
            message: e.without_url().to_string(),
        })
    }
}

impl EnvironmentProvider for OpenWeatherClient {
    fn fetch(&self, city: &str) -> EnvironmentReading {
        match self.try_fetch(city) {
            Ok(reading) => {
                tracing::debug!(
                    city,
                    temperature = ?reading.temperature,
                    aqi = ?reading.aqi,
                    "Fetched live environment"
                );
                reading
            }
            Err(e @ FetchError::Offline) => {
                tracing::debug!(city, "Offline mode, using fallback values");
                EnvironmentReading::fallback(city, e.to_string())
            }
            Err(e) => {
                tracing::warn!(city, error = %e, "Environment fetch failed, using fallback values");
                EnvironmentReading::fallback(city, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FALLBACK_AQI, FALLBACK_TEMPERATURE_C};
    use pretty_assertions::assert_eq;

    const WEATHER_JSON: &str = r#"{
        "coord": {"lon": 55.3, "lat": 25.2},
        "weather": [{"id": 800, "main": "Clear"}],
        "main": {"temp": 35.4, "feels_like": 38.0, "pressure": 1008, "humidity": 30},
        "name": "Dubai"
    }"#;

    const POLLUTION_JSON: &str = r#"{
        "coord": {"lon": 55.3, "lat": 25.2},
        "list": [{"main": {"aqi": 5}, "components": {"pm2_5": 80.1}, "dt": 1700000000}]
    }"#;

    fn unreachable_client(key: &str) -> OpenWeatherClient {
        OpenWeatherClient::new(Some(key.to_string()), Duration::from_secs(1), 1)
            .with_endpoints("http://127.0.0.1:9/weather", "http://127.0.0.1:9/air_pollution")
            .with_retry_backoff(Duration::from_millis(10))
    }

    #[test]
    fn test_reading_from_payloads() {
        let weather: WeatherPayload = serde_json::from_str(WEATHER_JSON).expect("Should parse");
        let pollution: PollutionPayload = serde_json::from_str(POLLUTION_JSON).expect("Should parse");

        let reading = reading_from("Dubai", weather, pollution).expect("Should combine");
        assert_eq!(
            reading,
            EnvironmentReading::live("Dubai", 35.4, 30.0, 5, Coordinates { lat: 25.2, lon: 55.3 })
        );
    }

    #[test]
    fn test_aqi_out_of_range_is_rejected() {
        let weather: WeatherPayload = serde_json::from_str(WEATHER_JSON).expect("Should parse");
        let pollution: PollutionPayload =
            serde_json::from_str(r#"{"list": [{"main": {"aqi": 7}}]}"#).expect("Should parse");

        let err = reading_from("Dubai", weather, pollution).expect_err("Should reject");
        assert!(matches!(err, FetchError::AqiOutOfRange(7)));
    }

    #[test]
    fn test_empty_pollution_list_is_rejected() {
        let weather: WeatherPayload = serde_json::from_str(WEATHER_JSON).expect("Should parse");
        let pollution: PollutionPayload =
            serde_json::from_str(r#"{"list": []}"#).expect("Should parse");
        assert!(matches!(
            reading_from("Dubai", weather, pollution),
            Err(FetchError::Decode { .. })
        ));
    }

    #[test]
    fn test_offline_client_falls_back() {
        let reading = OpenWeatherClient::offline().fetch("London");
        assert!(!reading.success);
        assert_eq!(reading.temperature, Some(FALLBACK_TEMPERATURE_C));
        assert_eq!(reading.aqi, Some(FALLBACK_AQI));
        assert_eq!(reading.city, "London");
    }

    #[test]
    fn test_missing_key_falls_back() {
        let client = OpenWeatherClient::new(Some("  ".to_string()), DEFAULT_TIMEOUT, 0);
        let reading = client.fetch("London");
        assert!(!reading.success);
        assert_eq!(reading.error.as_deref(), Some("Weather API key is not configured"));
    }

    #[test]
    fn test_unreachable_service_falls_back_deterministically() {
        let client = unreachable_client("k");
        let first = client.fetch("Paris");
        let second = client.fetch("Paris");

        assert!(!first.success);
        assert_eq!(first.temperature, second.temperature);
        assert_eq!(first.aqi, second.aqi);
        assert_eq!(first.humidity, second.humidity);
        assert_eq!(first.coordinates, None);
    }

    #[test]
    fn test_api_key_never_in_error() {
        let key = "0123456789abcdef0123456789abcdef";
        let reading = unreachable_client(key).fetch("Paris");
        let error = reading.error.expect("Should carry error");
        assert!(!error.contains(key));
        assert!(!format!("{:?}", unreachable_client(key)).contains(key));
    }
}
