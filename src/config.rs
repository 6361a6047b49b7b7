//! Configuration management for SuperTask.
//!
//! Configuration can be set via environment variables:
//! - `GEMINI_API_KEY` - Required. API key for the assistant gateway.
//! - `GEMINI_MODEL` - Optional. Assistant model name. Defaults to `gemini-3-flash-preview`.
//! - `DATA_DIR` - Optional. Directory for the persisted task snapshot. Defaults to `./.supertask`.
//! - `TASK_STORE` - Optional. `file` (default) or `memory`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `REMINDER_INTERVAL_SECS` - Optional. Reminder scan interval. Defaults to `60`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::TaskStoreType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant gateway API key
    pub api_key: String,

    /// Assistant model identifier
    pub model: String,

    /// Directory holding the persisted task snapshot
    pub data_dir: PathBuf,

    /// Storage backend selection
    pub store_type: TaskStoreType,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Interval between reminder scans
    pub reminder_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-3-flash-preview".to_string());

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.supertask"));

        let store_type = std::env::var("TASK_STORE")
            .map(|s| TaskStoreType::parse(&s))
            .unwrap_or_default();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let reminder_interval = std::env::var("REMINDER_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidValue("REMINDER_INTERVAL_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            api_key,
            model,
            data_dir,
            store_type,
            host,
            port,
            reminder_interval,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String, data_dir: PathBuf) -> Self {
        Self {
            api_key,
            model,
            data_dir,
            store_type: TaskStoreType::Memory,
            host: "127.0.0.1".to_string(),
            port: 3000,
            reminder_interval: Duration::from_secs(60),
        }
    }
}
