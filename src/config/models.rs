use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub mode: ModeConfig,
}

/// Remote API endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bearer token (loaded from environment, not from config file)
    #[serde(skip)]
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            health_path: default_health_path(),
            user_agent: default_user_agent(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_user_agent() -> String {
    concat!("fittrack/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Default retry behaviour for request methods
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Also retry HTTP 429 responses
    #[serde(default)]
    pub retry_on_429: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            retry_on_429: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

/// Diagnostic logger settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Absolute collector URL; derived from `api.base_url` when unset
    pub collector_url: Option<String>,
    #[serde(default = "default_forward_timeout_ms")]
    pub forward_timeout_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            collector_url: None,
            forward_timeout_ms: default_forward_timeout_ms(),
        }
    }
}

fn default_capacity() -> usize {
    crate::logger::DEFAULT_CAPACITY
}

fn default_forward_timeout_ms() -> u64 {
    5_000
}

/// Execution-mode flags. Both off is test mode: no console noise, no network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModeConfig {
    /// Mirror diagnostic entries to the console
    #[serde(default)]
    pub development: bool,
    /// Ship warn/error entries to the remote collector
    #[serde(default)]
    pub production: bool,
}

impl Config {
    /// Collector endpoint: `logging.collector_url`, else `/api/logs` on the
    /// API origin.
    pub fn collector_url(&self) -> String {
        if let Some(url) = &self.logging.collector_url {
            return url.clone();
        }

        match Url::parse(&self.api.base_url).and_then(|base| base.join("/api/logs")) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}/logs", self.api.base_url.trim_end_matches('/')),
        }
    }
}
