use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::logger::LogLevel;

/// Failures surfaced by [`ApiClient`](super::ApiClient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never reached the server
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// HTTP status, when the server responded
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Network-level failures and server 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Http { .. } => "HTTP_ERROR",
            ApiError::Timeout => "TIMEOUT",
            ApiError::InvalidUrl(_) => "INVALID_URL",
            ApiError::Encode(_) => "ENCODE_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
            ApiError::Io(_) => "IO_ERROR",
        }
    }

    /// Diagnostic level used when this failure reaches the caller.
    /// Client errors are the caller's problem and only warrant a warning.
    pub fn log_level(&self) -> LogLevel {
        match self {
            ApiError::Http { status, .. } if (400..500).contains(status) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    /// Build an `Http` error, preferring the server-provided message
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = extract_message(body)
            .unwrap_or_else(|| default_message(status.as_u16()).to_string());

        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_builder() {
            ApiError::InvalidUrl(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Io(e.to_string())
    }
}

/// `{"message": ..}`, `{"error": ".."}` or `{"error": {"message": ..}}`
fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid data",
        401 => "Unauthorized",
        403 => "Access denied",
        404 => "Resource not found",
        409 => "Data conflict",
        429 => "Too many attempts. Try again in a few minutes",
        500 => "Internal server error",
        502 => "Service temporarily unavailable",
        503 => "Service under maintenance",
        _ => "Unknown error",
    }
}
