//! Log entry model shared by the diagnostic buffer and the remote collector

use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Length of the correlation fingerprint attached to every entry
pub const FINGERPRINT_LEN: usize = 8;

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Levels that are shipped to the remote collector in production
    pub fn is_forwarded(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Warn)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// A single diagnostic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Captured only for `error` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub fingerprint: String,
}

impl LogEntry {
    /// Build an entry stamped with the current time and a fresh fingerprint
    pub fn new(level: LogLevel, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        let stack = match level {
            LogLevel::Error => Some(Backtrace::force_capture().to_string()),
            _ => None,
        };

        Self {
            timestamp: now_millis(),
            level,
            message: message.into(),
            data,
            stack,
            fingerprint: fingerprint(),
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Short correlation id. Not a uniqueness guarantee.
fn fingerprint() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(FINGERPRINT_LEN);
    id
}
