//! Diagnostic logger
//!
//! A bounded, append-only buffer of [`LogEntry`] records shared by every part
//! of the client. One instance is constructed at startup and cloned into each
//! consumer; all clones see the same buffer.
//!
//! - In development mode every entry is mirrored to the console via `tracing`.
//! - In production mode `warn` and `error` entries are shipped to the remote
//!   collector on a detached task. The logging call never waits for it and a
//!   failed shipment is dropped silently.
//!
//! # Usage
//!
//! ```no_run
//! use fittrack::logger::{DiagnosticLogger, LogLevel};
//!
//! let logger = DiagnosticLogger::default();
//! logger.warn("profile request slow", None);
//! let errors = logger.get_logs(Some(LogLevel::Error));
//! assert!(errors.is_empty());
//! ```

pub mod entry;
pub mod forward;

pub use entry::{LogEntry, LogLevel, ParseLevelError};
pub use forward::{ForwardError, HttpLogForwarder, LogForwarder};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use crate::config::{Config, ModeConfig};

/// Default number of entries kept in memory
pub const DEFAULT_CAPACITY: usize = 1000;

struct Inner {
    buffer: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    mode: ModeConfig,
    forwarder: RwLock<Option<Arc<dyn LogForwarder>>>,
}

/// Shared handle to the process-wide diagnostic buffer
#[derive(Clone)]
pub struct DiagnosticLogger {
    inner: Arc<Inner>,
}

impl DiagnosticLogger {
    /// Create an empty logger. A capacity of zero is raised to one.
    pub fn new(capacity: usize, mode: ModeConfig) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                buffer: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                mode,
                forwarder: RwLock::new(None),
            }),
        }
    }

    /// Build the logger described by `config`, wiring the HTTP collector
    /// when production mode is on.
    pub fn from_config(config: &Config) -> Result<Self, ForwardError> {
        let logger = Self::new(config.logging.capacity, config.mode.clone());
        if !config.mode.production {
            return Ok(logger);
        }

        let forwarder = HttpLogForwarder::new(
            config.collector_url(),
            Duration::from_millis(config.logging.forward_timeout_ms),
        )?;
        Ok(logger.with_forwarder(Arc::new(forwarder)))
    }

    /// Attach a remote forwarder, replacing any previous one.
    ///
    /// The forwarder lives in the shared state, so every existing clone
    /// starts forwarding too.
    pub fn with_forwarder(self, forwarder: Arc<dyn LogForwarder>) -> Self {
        *self
            .inner
            .forwarder
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(forwarder);
        self
    }

    pub fn error(&self, message: impl Into<String>, data: Option<serde_json::Value>) {
        self.record(LogLevel::Error, message.into(), data);
    }

    pub fn warn(&self, message: impl Into<String>, data: Option<serde_json::Value>) {
        self.record(LogLevel::Warn, message.into(), data);
    }

    pub fn info(&self, message: impl Into<String>, data: Option<serde_json::Value>) {
        self.record(LogLevel::Info, message.into(), data);
    }

    pub fn debug(&self, message: impl Into<String>, data: Option<serde_json::Value>) {
        self.record(LogLevel::Debug, message.into(), data);
    }

    /// Record an entry at an arbitrary level
    pub fn log(&self, level: LogLevel, message: impl Into<String>, data: Option<serde_json::Value>) {
        self.record(level, message.into(), data);
    }

    fn record(&self, level: LogLevel, message: String, data: Option<serde_json::Value>) {
        let entry = LogEntry::new(level, message, data);

        {
            let mut buffer = self.inner.lock_buffer();
            buffer.push_back(entry.clone());
            while buffer.len() > self.inner.capacity {
                buffer.pop_front();
            }
        }

        if self.inner.mode.development {
            mirror(&entry);
        }

        if self.inner.mode.production && level.is_forwarded() {
            let forwarder = self
                .inner
                .forwarder
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(forwarder) = forwarder {
                forward::dispatch(forwarder, entry);
            }
        }
    }

    /// Snapshot of the buffer, optionally restricted to one level
    pub fn get_logs(&self, level: Option<LogLevel>) -> Vec<LogEntry> {
        let buffer = self.inner.lock_buffer();
        match level {
            Some(level) => buffer.iter().filter(|e| e.level == level).cloned().collect(),
            None => buffer.iter().cloned().collect(),
        }
    }

    pub fn clear_logs(&self) {
        self.inner.lock_buffer().clear();
    }

    /// Pretty-printed JSON of the whole buffer, for attaching to bug reports
    pub fn export_logs(&self) -> Result<String, serde_json::Error> {
        let logs = self.get_logs(None);
        serde_json::to_string_pretty(&logs)
    }

    pub fn len(&self) -> usize {
        self.inner.lock_buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn mode(&self) -> &ModeConfig {
        &self.inner.mode
    }
}

impl Default for DiagnosticLogger {
    /// Test-mode logger: no console mirroring, no forwarding
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, ModeConfig::default())
    }
}

impl Inner {
    // The buffer holds plain data, so a panic mid-push leaves it usable.
    fn lock_buffer(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mirror(entry: &LogEntry) {
    const TARGET: &str = "fittrack::diagnostic";
    let fingerprint = entry.fingerprint.as_str();
    let data = entry.data.as_ref().map(|d| d.to_string()).unwrap_or_default();
    match entry.level {
        LogLevel::Error => tracing::error!(target: TARGET, fingerprint, data, "{}", entry.message),
        LogLevel::Warn => tracing::warn!(target: TARGET, fingerprint, data, "{}", entry.message),
        LogLevel::Info => tracing::info!(target: TARGET, fingerprint, data, "{}", entry.message),
        LogLevel::Debug => tracing::debug!(target: TARGET, fingerprint, data, "{}", entry.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;

    struct ChannelForwarder(mpsc::UnboundedSender<LogEntry>);

    #[async_trait]
    impl LogForwarder for ChannelForwarder {
        async fn forward(&self, entry: &LogEntry) -> Result<(), ForwardError> {
            let _ = self.0.send(entry.clone());
            Ok(())
        }
    }

    struct FailingForwarder;

    #[async_trait]
    impl LogForwarder for FailingForwarder {
        async fn forward(&self, _entry: &LogEntry) -> Result<(), ForwardError> {
            Err(ForwardError::Request("collector down".to_string()))
        }
    }

    fn production() -> ModeConfig {
        ModeConfig {
            development: false,
            production: true,
        }
    }

    #[test]
    fn test_capacity_keeps_most_recent_in_order() {
        let logger = DiagnosticLogger::default();
        for i in 0..1500 {
            logger.info(format!("event {i}"), None);
        }

        let logs = logger.get_logs(None);
        assert_eq!(logs.len(), 1000);
        assert_eq!(logs.first().unwrap().message, "event 500");
        assert_eq!(logs.last().unwrap().message, "event 1499");
        for (offset, entry) in logs.iter().enumerate() {
            assert_eq!(entry.message, format!("event {}", 500 + offset));
        }
    }

    #[test]
    fn test_small_capacity() {
        let logger = DiagnosticLogger::new(2, ModeConfig::default());
        logger.debug("a", None);
        logger.debug("b", None);
        logger.debug("c", None);
        let messages: Vec<_> = logger.get_logs(None).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let logger = DiagnosticLogger::new(0, ModeConfig::default());
        assert_eq!(logger.capacity(), 1);
        logger.info("kept", None);
        assert_eq!(logger.len(), 1);
    }

    #[test]
    fn test_level_filter_is_ordered_snapshot() {
        let logger = DiagnosticLogger::default();
        logger.error("first", None);
        logger.info("noise", None);
        logger.error("second", Some(json!({"status": 500})));
        logger.warn("minor", None);

        let errors = logger.get_logs(Some(LogLevel::Error));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "first");
        assert_eq!(errors[1].message, "second");
        assert!(errors.iter().all(|e| e.level == LogLevel::Error));

        logger.error("third", None);
        logger.clear_logs();
        assert_eq!(errors.len(), 2);
        assert!(logger.is_empty());
    }

    #[test]
    fn test_clones_share_buffer() {
        let logger = DiagnosticLogger::default();
        let other = logger.clone();
        other.warn("from clone", None);
        assert_eq!(logger.len(), 1);
    }

    #[test]
    fn test_export_is_pretty_json_array() {
        let logger = DiagnosticLogger::default();
        logger.info("exported", Some(json!({"k": 1})));

        let text = logger.export_logs().unwrap();
        assert!(text.contains('\n'));
        let parsed: Vec<LogEntry> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].message, "exported");
    }

    #[tokio::test]
    async fn test_production_forwards_warn_and_error_only() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let logger = DiagnosticLogger::new(DEFAULT_CAPACITY, production())
            .with_forwarder(Arc::new(ChannelForwarder(tx)));

        logger.info("not shipped", None);
        logger.debug("not shipped", None);
        logger.warn("shipped warn", None);
        logger.error("shipped error", None);

        let mut shipped = vec![
            rx.recv().await.unwrap().message,
            rx.recv().await.unwrap().message,
        ];
        shipped.sort();
        assert_eq!(shipped, vec!["shipped error", "shipped warn"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_forwarding_outside_production() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let logger = DiagnosticLogger::new(DEFAULT_CAPACITY, ModeConfig::default())
            .with_forwarder(Arc::new(ChannelForwarder(tx)));

        logger.error("local only", None);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forwarding_failure_is_swallowed() {
        let logger = DiagnosticLogger::new(DEFAULT_CAPACITY, production())
            .with_forwarder(Arc::new(FailingForwarder));

        for _ in 0..10 {
            logger.error("collector is down", None);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(logger.len(), 10);
    }

    #[tokio::test]
    async fn test_forwarder_attached_late_reaches_existing_clones() {
        let logger = DiagnosticLogger::new(DEFAULT_CAPACITY, production());
        let consumer = logger.clone();
        logger.info("before", None);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let logger = logger.with_forwarder(Arc::new(ChannelForwarder(tx)));
        consumer.error("from consumer", None);

        assert_eq!(logger.len(), 2);
        assert_eq!(consumer.len(), 2);
        assert_eq!(rx.recv().await.unwrap().message, "from consumer");
    }

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn console_output(mode: ModeConfig) -> String {
        let writer = CaptureWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let logger = DiagnosticLogger::new(DEFAULT_CAPACITY, mode);
            logger.warn("disk almost full", Some(json!({"free_mb": 12})));
            logger.debug("cache warmed", None);
        });

        let bytes = writer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_development_mode_mirrors_to_console() {
        let output = console_output(ModeConfig {
            development: true,
            production: false,
        });

        assert!(output.contains("fittrack::diagnostic"));
        assert!(output.contains("disk almost full"));
        assert!(output.contains("cache warmed"));
        assert!(output.contains("free_mb"));
    }

    #[test]
    fn test_other_modes_stay_quiet() {
        assert!(!console_output(ModeConfig::default()).contains("fittrack::diagnostic"));
        assert!(!console_output(production()).contains("fittrack::diagnostic"));
    }
}
