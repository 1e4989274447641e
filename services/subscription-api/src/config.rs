//! Configuration for the Subscription API service.

use std::time::Duration;

use tiffin_core::CoreConfig;

/// Subscription API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Payment gateway webhook secret
    pub webhook_secret: String,
    /// Marketplace-local UTC offset in minutes
    pub local_offset_minutes: i32,
    /// Daily cutoff hour (local time)
    pub cutoff_hour: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let webhook_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("PAYMENT_WEBHOOK_SECRET"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Kitchens run on one fixed offset; default to UTC.
        let local_offset_minutes = std::env::var("LOCAL_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("LOCAL_UTC_OFFSET_MINUTES"))?;

        let cutoff_hour: u32 = std::env::var("CUTOFF_HOUR")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("CUTOFF_HOUR"))?;
        if cutoff_hour > 23 {
            return Err(ConfigError::Invalid("CUTOFF_HOUR"));
        }

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            webhook_secret,
            local_offset_minutes,
            cutoff_hour,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }

    /// Build the core configuration
    pub fn core(&self) -> CoreConfig {
        CoreConfig::new()
            .with_offset_minutes(self.local_offset_minutes)
            .with_cutoff_hour(self.cutoff_hour)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
