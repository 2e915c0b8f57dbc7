//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PARCELFLOW_API_BASE_URL` - Base URL of the REST backend
//!
//! ## Optional
//! - `PARCELFLOW_API_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `PARCELFLOW_SESSION_FILE` - Path for the persisted session
//!   (default: `parcelflow-session.json` in the working directory)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fixed file name used when `PARCELFLOW_SESSION_FILE` is not set.
pub const DEFAULT_SESSION_FILE: &str = "parcelflow-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, configured once at startup.
    pub base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Where the session is persisted across restarts. `None` disables
    /// persistence entirely (used by tests).
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: Some(PathBuf::from(DEFAULT_SESSION_FILE)),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw_url = get_required_env("PARCELFLOW_API_BASE_URL")?;
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("PARCELFLOW_API_BASE_URL".to_string(), e.to_string())
        })?;

        let timeout_secs = match std::env::var("PARCELFLOW_API_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("PARCELFLOW_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let session_file = std::env::var("PARCELFLOW_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            session_file: Some(session_file),
        })
    }

    /// Disable session persistence (in-memory session only).
    #[must_use]
    pub fn without_persistence(mut self) -> Self {
        self.session_file = None;
        self
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new(Url::parse("https://api.example.com").expect("url"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(
            config.session_file,
            Some(PathBuf::from(DEFAULT_SESSION_FILE))
        );
    }

    #[test]
    fn test_without_persistence() {
        let config = ClientConfig::new(Url::parse("https://api.example.com").expect("url"))
            .without_persistence();
        assert!(config.session_file.is_none());
    }
}
