use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const DEFAULT_API_BASE_URL: &str = "https://api.mail.tm";
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_PREFETCH_CONCURRENCY: usize = 4;
const MAX_PREFETCH_CONCURRENCY: usize = 32;
const DEFAULT_PAGE_SIZE: u32 = 30;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub mirror_url: Option<String>,
    #[serde(default)]
    pub mirror_api_key: Option<String>,
    #[serde(default)]
    pub retry_attempts: Option<u32>,
    #[serde(default)]
    pub retry_base_delay_ms: Option<u64>,
    #[serde(default)]
    pub prefetch_concurrency: Option<usize>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

impl Settings {
    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Remote mirror endpoint, when both url and key are configured.
    pub fn mirror_remote(&self) -> AppResult<Option<(&str, &str)>> {
        let url = self.mirror_url.as_deref().map(str::trim).filter(|v| !v.is_empty());
        let key = self
            .mirror_api_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (url, key) {
            (Some(url), Some(key)) => Ok(Some((url, key))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(AppError::Config(
                "mirror_url is set but mirror_api_key is missing in profile settings".to_string(),
            )),
            (None, Some(_)) => Err(AppError::Config(
                "mirror_api_key is set but mirror_url is missing in profile settings".to_string(),
            )),
        }
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS).max(1)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(
            self.retry_base_delay_ms
                .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
        )
    }

    pub fn prefetch_concurrency(&self) -> usize {
        self.prefetch_concurrency
            .unwrap_or(DEFAULT_PREFETCH_CONCURRENCY)
            .clamp(1, MAX_PREFETCH_CONCURRENCY)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
                .max(1),
        )
    }
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}
