//! Runtime configuration from environment variables.
//!
//! The binary calls [`load_dotenv`] once, before logging starts, so a `.env`
//! file in the working directory can supply both log and engine settings.
//! Unparseable numeric or boolean values fall back to their defaults with a
//! warning; configuration never aborts startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MODEL_DIR_ENV: &str = "CARDIORISK_MODEL_DIR";
pub const ADVICE_DB_ENV: &str = "CARDIORISK_ADVICE_DB";
pub const DB_PATH_ENV: &str = "CARDIORISK_DB_PATH";
pub const WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const WEATHER_TIMEOUT_ENV: &str = "CARDIORISK_WEATHER_TIMEOUT_SECS";
pub const WEATHER_RETRIES_ENV: &str = "CARDIORISK_WEATHER_RETRIES";
pub const PERSIST_ENV: &str = "CARDIORISK_PERSIST";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_ADVICE_DB: &str = "data/advice_db.json";
const DEFAULT_DB_PATH: &str = "cardiorisk.db";
const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEATHER_RETRIES: u32 = 1;

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub model_dir: PathBuf,
    pub advice_db: PathBuf,
    pub db_path: PathBuf,
    pub weather_api_key: Option<String>,
    pub weather_timeout: Duration,
    pub weather_retries: u32,
    pub persist: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("model_dir", &self.model_dir)
            .field("advice_db", &self.advice_db)
            .field("db_path", &self.db_path)
            .field("weather_api_key", &self.weather_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("weather_timeout", &self.weather_timeout)
            .field("weather_retries", &self.weather_retries)
            .field("persist", &self.persist)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            advice_db: PathBuf::from(DEFAULT_ADVICE_DB),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            weather_api_key: None,
            weather_timeout: Duration::from_secs(DEFAULT_WEATHER_TIMEOUT_SECS),
            weather_retries: DEFAULT_WEATHER_RETRIES,
            persist: true,
        }
    }
}

/// Load `.env` from the working directory or its ancestors into the process
/// environment.
///
/// Returns the loaded path, or `None` when there is no `.env` file.
///
/// # Errors
/// Returns the dotenvy error for an unreadable or malformed file.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    present(dotenvy::dotenv())
}

/// Load a specific env file into the process environment.
///
/// # Errors
/// Returns the dotenvy error for an unreadable or malformed file.
pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    present(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn present(loaded: Result<PathBuf, dotenvy::Error>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map_or(default, PathBuf::from)
        };

        Self {
            model_dir: path(MODEL_DIR_ENV, defaults.model_dir),
            advice_db: path(ADVICE_DB_ENV, defaults.advice_db),
            db_path: path(DB_PATH_ENV, defaults.db_path),
            weather_api_key: lookup(WEATHER_API_KEY_ENV)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            weather_timeout: Duration::from_secs(parse_or_default(
                WEATHER_TIMEOUT_ENV,
                lookup(WEATHER_TIMEOUT_ENV),
                DEFAULT_WEATHER_TIMEOUT_SECS,
            ))
            .max(Duration::from_secs(1)),
            weather_retries: parse_or_default(
                WEATHER_RETRIES_ENV,
                lookup(WEATHER_RETRIES_ENV),
                DEFAULT_WEATHER_RETRIES,
            ),
            persist: parse_flag(PERSIST_ENV, lookup(PERSIST_ENV), defaults.persist),
        }
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using default {}", key, v, default);
            default
        }),
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::trim) {
        None => default,
        Some("1" | "true" | "TRUE" | "yes" | "YES") => true,
        Some("0" | "false" | "FALSE" | "no" | "NO") => false,
        Some(other) => {
            tracing::warn!("Invalid {}={:?}, using default {}", key, other, default);
            default
        }
    }
}
