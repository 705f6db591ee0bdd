//! Service configuration.
//!
//! Loaded from a JSON file with camelCase keys. Every key is optional:
//!
//! ```json
//! {
//!   "serviceName": "product-data-service",
//!   "port": 8080,
//!   "responseLimit": 10000,
//!   "loggingLevel": "info"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::store::MAX_OPS_PER_CALL;

/// Error type for loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings of the product data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub service_name: String,
    pub port: u16,
    /// Ceiling on entries returned by one retrieve.
    pub response_limit: usize,
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    pub logging_level: String,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Upsert instructions per store call for the in-process store.
    pub max_ops_per_call: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "product-data-service".to_string(),
            port: 8080,
            response_limit: 10_000,
            logging_level: "info".to_string(),
            max_body_bytes: 16 << 20, // 16MB
            max_ops_per_call: MAX_OPS_PER_CALL,
        }
    }
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_limit == 0 {
            return Err(ConfigError::Invalid("responseLimit must be positive".into()));
        }
        if self.max_ops_per_call == 0 {
            return Err(ConfigError::Invalid("maxOpsPerCall must be positive".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("maxBodyBytes must be positive".into()));
        }
        self.log_level()?;
        Ok(())
    }

    /// The configured logging level as a `tracing` level.
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.logging_level.parse::<Level>().map_err(|_| {
            ConfigError::Invalid(format!("unknown loggingLevel '{}'", self.logging_level))
        })
    }

    /// Address the HTTP server listens on.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
