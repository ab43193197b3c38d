//! Our World In Data COVID-19 dataset download.

use std::thread;
use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::Client;

use crate::domain::{Dataset, SourceConfig};
use crate::error::AppError;
use crate::io::ingest::{load_dataset_file, parse_dataset};

pub struct OwidClient {
    client: Client,
    config: SourceConfig,
}

impl OwidClient {
    pub fn new(config: SourceConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::data_unavailable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Download and parse the dataset, retrying with exponential backoff.
    pub fn fetch_dataset(&self) -> Result<Dataset, AppError> {
        let attempts = self.config.attempts.max(1);
        let mut delay = self.config.backoff;
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.fetch_once() {
                Ok(body) => {
                    info!("downloaded {} bytes from {}", body.len(), self.config.url);
                    return parse_dataset(body.as_bytes());
                }
                Err(err) => {
                    warn!("fetch attempt {attempt}/{attempts} failed: {err}");
                    last_err = Some(err);
                    if attempt < attempts {
                        thread::sleep(delay);
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::data_unavailable("OWID request was not attempted.")))
    }

    fn fetch_once(&self) -> Result<String, AppError> {
        let resp = self
            .client
            .get(&self.config.url)
            .send()
            .map_err(|e| AppError::data_unavailable(format!("OWID request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::data_unavailable(format!(
                "OWID request failed with status {}.",
                resp.status()
            )));
        }

        resp.text()
            .map_err(|e| AppError::data_unavailable(format!("Failed to read OWID response: {e}")))
    }
}

/// Load the dataset from the configured local file, or download it.
pub fn load_dataset(config: &SourceConfig) -> Result<Dataset, AppError> {
    if let Some(path) = &config.csv_path {
        info!("reading dataset from {}", path.display());
        return load_dataset_file(path);
    }
    OwidClient::new(config.clone())?.fetch_dataset()
}

/// Source settings from the environment (`.env` is honoured).
///
/// - `OWID_DATA_URL`: dataset URL
/// - `OWID_TIMEOUT_SECS`: request timeout
/// - `OWID_RETRIES`: total attempts
pub fn source_config_from_env() -> SourceConfig {
    dotenvy::dotenv().ok();
    let mut config = SourceConfig::default();

    if let Ok(url) = std::env::var("OWID_DATA_URL") {
        if !url.trim().is_empty() {
            config.url = url.trim().to_string();
        }
    }
    if let Some(secs) = env_u64("OWID_TIMEOUT_SECS") {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(n) = env_u64("OWID_RETRIES") {
        config.attempts = u32::try_from(n).unwrap_or(u32::MAX).max(1);
    }
    config
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("ignoring {name}='{raw}': {e}");
            None
        }
    }
}
