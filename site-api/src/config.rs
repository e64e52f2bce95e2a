use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.krakenflex.systems/interview-tests-mock-api/v1";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    #[error("base_url cannot be empty")]
    EmptyBaseUrl,
}

/// Settings for talking to the site API. Every field has a default so the
/// whole section can be omitted from the config file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL that endpoint paths are appended to.
    pub base_url: String,
    /// Total number of attempts per request, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts. Zero retries immediately.
    pub retry_delay_ms: u64,
    /// Per-request timeout. Unset leaves reqwest's default in place.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 0,
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::NoAttempts);
        }
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
