//! Configuration management for fittrack
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use fittrack::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("API base URL: {}", config.api.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `FITTRACK__<section>__<key>`
//!
//! Examples:
//! - `FITTRACK__API__BASE_URL=https://fit.example.com/api`
//! - `FITTRACK__RETRY__MAX_ATTEMPTS=5`
//! - `FITTRACK__MODE__PRODUCTION=true`
//!
//! The bearer token is read from `FITTRACK_TOKEN` and never from the file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/fittrack.toml`.
//! This can be overridden using the `FITTRACK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{ApiConfig, Config, LoggingConfig, ModeConfig, RetryConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
