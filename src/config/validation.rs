use super::models::Config;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Health path must start with '/': {0}")]
    InvalidHealthPath(String),

    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: &'static str },

    #[error("retry.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("logging.capacity must be at least 1")]
    ZeroCapacity,

    #[error("Invalid collector URL '{0}'")]
    InvalidCollectorUrl(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_api(config)?;
    validate_retry(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_api(config: &Config) -> Result<(), ValidationError> {
    let url = Url::parse(&config.api.base_url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: config.api.base_url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidBaseUrl {
            url: config.api.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if !config.api.health_path.starts_with('/') {
        return Err(ValidationError::InvalidHealthPath(
            config.api.health_path.clone(),
        ));
    }

    if config.api.request_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "api.request_timeout_ms",
        });
    }
    if config.api.connect_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "api.connect_timeout_ms",
        });
    }

    Ok(())
}

fn validate_retry(config: &Config) -> Result<(), ValidationError> {
    if config.retry.max_attempts == 0 {
        return Err(ValidationError::ZeroAttempts);
    }
    Ok(())
}

fn validate_logging(config: &Config) -> Result<(), ValidationError> {
    if config.logging.capacity == 0 {
        return Err(ValidationError::ZeroCapacity);
    }

    if let Some(url) = &config.logging.collector_url {
        if Url::parse(url).is_err() {
            return Err(ValidationError::InvalidCollectorUrl(url.clone()));
        }
    }

    if config.logging.forward_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "logging.forward_timeout_ms",
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));

        config.api.base_url = "ftp://files.example.com/api".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_relative_health_path() {
        let mut config = Config::default();
        config.api.health_path = "health".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidHealthPath(_))
        ));
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(matches!(validate(&config), Err(ValidationError::ZeroAttempts)));

        let mut config = Config::default();
        config.logging.capacity = 0;
        assert!(matches!(validate(&config), Err(ValidationError::ZeroCapacity)));

        let mut config = Config::default();
        config.api.request_timeout_ms = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroTimeout {
                field: "api.request_timeout_ms"
            })
        ));
    }

    #[test]
    fn test_rejects_bad_collector_url() {
        let mut config = Config::default();
        config.logging.collector_url = Some("::nope".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidCollectorUrl(_))
        ));
    }
}
