//! Remote shipping of warn/error entries to the log collector

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::entry::LogEntry;

/// Forwarding failures. Never surfaced past the forwarding task.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("collector request failed: {0}")]
    Request(String),

    #[error("entry could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for forwarded log entries
#[async_trait]
pub trait LogForwarder: Send + Sync {
    async fn forward(&self, entry: &LogEntry) -> Result<(), ForwardError>;
}

/// Posts entries as JSON to `POST {collector_url}`
pub struct HttpLogForwarder {
    client: Client,
    collector_url: String,
}

impl HttpLogForwarder {
    pub fn new(collector_url: impl Into<String>, timeout: Duration) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForwardError::Request(e.to_string()))?;

        Ok(Self {
            client,
            collector_url: collector_url.into(),
        })
    }

    pub fn collector_url(&self) -> &str {
        &self.collector_url
    }
}

#[async_trait]
impl LogForwarder for HttpLogForwarder {
    async fn forward(&self, entry: &LogEntry) -> Result<(), ForwardError> {
        let body = serde_json::to_vec(entry)?;

        // Response status is intentionally not inspected
        self.client
            .post(&self.collector_url)
            .header(reqwest::header::CONTENT_TYPE, mime::APPLICATION_JSON.essence_str())
            .body(body)
            .send()
            .await
            .map_err(|e| ForwardError::Request(e.to_string()))?;

        Ok(())
    }
}

/// Ship an entry on a detached task.
///
/// Returns immediately. Outside a tokio runtime the entry is not shipped.
/// The task owns only the forwarder and the entry, so a failure here has
/// no path back into the logger.
pub(crate) fn dispatch(forwarder: Arc<dyn LogForwarder>, entry: LogEntry) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return;
    };

    handle.spawn(async move {
        let _ = forwarder.forward(&entry).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::entry::LogLevel;

    #[tokio::test]
    async fn test_unreachable_collector_is_an_error_not_a_panic() {
        let forwarder =
            HttpLogForwarder::new("http://127.0.0.1:9/api/logs", Duration::from_millis(500))
                .unwrap();
        let entry = LogEntry::new(LogLevel::Warn, "offline", None);

        let result = forwarder.forward(&entry).await;
        assert!(matches!(result, Err(ForwardError::Request(_))));
    }

    #[test]
    fn test_dispatch_without_runtime_is_a_noop() {
        let forwarder: Arc<dyn LogForwarder> = Arc::new(
            HttpLogForwarder::new("http://127.0.0.1:9/api/logs", Duration::from_millis(10))
                .unwrap(),
        );
        dispatch(forwarder, LogEntry::new(LogLevel::Error, "no runtime", None));
    }
}
