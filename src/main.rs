//! Cardiorisk: cardiac risk fusion and recommendation engine.
//!
//! Command-line entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::openweather::OpenWeatherClient;
use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::adapters::sqlite::SqliteStorage;
use cardiorisk::application::{AssessmentService, EngineContext};
use cardiorisk::config::{self, Settings};
use cardiorisk::domain::AssessmentRequest;
use cardiorisk::{PatientRecord, Tag};

#[derive(Parser, Debug)]
#[command(name = "cardiorisk")]
#[command(version)]
#[command(about = "Cardiac risk assessment with environmental context", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess one patient and print the JSON response
    Assess {
        /// JSON file with the patient record
        #[arg(short = 'p', long = "patient", value_name = "FILE")]
        patient: PathBuf,

        /// City used for live weather and air quality
        #[arg(short = 'c', long = "city", value_name = "CITY")]
        city: String,

        /// Reference stored with the assessment
        #[arg(long = "patient-id", value_name = "ID")]
        patient_id: Option<String>,

        /// Skip the weather service and use fallback values
        #[arg(long)]
        offline: bool,

        /// Do not write the assessment to the database
        #[arg(long = "no-persist")]
        no_persist: bool,
    },

    /// List the recommendation tags
    Tags,
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Console mode writes to stderr; stdout carries the JSON response.
    let log_mode = std::env::var("CARDIORISK_LOG_MODE").unwrap_or_else(|_| "console".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file = std::env::var("CARDIORISK_LOG_FILE")
            .unwrap_or_else(|_| "cardiorisk.log".to_string());

        if let Some(parent) = Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn open_storage(settings: &Settings) -> Option<Arc<SqliteStorage>> {
    match SqliteStorage::new(&settings.db_path) {
        Ok(storage) => Some(Arc::new(storage)),
        Err(e) => {
            tracing::warn!(
                "Assessment history disabled, cannot open {:?}: {}",
                settings.db_path,
                e
            );
            None
        }
    }
}

fn assess(
    settings: &Settings,
    patient_file: &Path,
    city: String,
    patient_id: Option<String>,
    offline: bool,
    persist: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(patient_file)
        .with_context(|| format!("Failed to read {patient_file:?}"))?;
    let patient: PatientRecord =
        serde_json::from_str(&content).context("Patient file is not a valid patient record")?;

    let mut request = AssessmentRequest::new(patient, city);
    if let Some(id) = patient_id {
        request = request.with_patient_id(id);
    }

    let context = Arc::new(EngineContext::from_settings(settings));
    let environment = Arc::new(if offline {
        OpenWeatherClient::offline()
    } else {
        OpenWeatherClient::new(
            settings.weather_api_key.clone(),
            settings.weather_timeout,
            settings.weather_retries,
        )
    });

    let mut service = AssessmentService::new(context, environment);
    if persist {
        if let Some(storage) = open_storage(settings) {
            service = service.with_sink(storage);
        }
    }

    let record = service.assess(&request)?;
    println!("{}", serde_json::to_string_pretty(&record.response())?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Log settings may live in .env; load it before the subscriber.
    let dotenv = config::load_dotenv();
    let _guard = init_logging()?;
    match dotenv {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {:?}", path),
        Ok(None) => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
    let settings = Settings::from_env();

    tracing::debug!("Starting cardiorisk with {:?}", settings);

    match cli.command {
        Command::Assess {
            patient,
            city,
            patient_id,
            offline,
            no_persist,
        } => assess(
            &settings,
            &patient,
            city,
            patient_id,
            offline,
            settings.persist && !no_persist,
        ),
        Command::Tags => {
            for tag in Tag::ALL {
                println!("{tag}");
            }
            Ok(())
        }
    }
}
