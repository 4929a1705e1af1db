//! Tracing setup and client counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

use crate::config::ModeConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise development mode logs the crate at
/// debug and everything else at info.
pub fn init_tracing(mode: &ModeConfig) {
    let default_directive = if mode.development {
        "fittrack=debug"
    } else {
        "fittrack=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters for outbound traffic
#[derive(Debug, Default)]
pub struct ClientMetrics {
    requests_sent: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
    uploads: AtomicU64,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retried(&self, times: u64) {
        if times > 0 {
            self.retries.fetch_add(times, Ordering::Relaxed);
            tracing::debug!(counter = "retries", times, "Metric incremented");
        }
    }

    pub fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failures", "Metric incremented");
    }

    pub fn upload_started(&self) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub retries: u64,
    pub failures: u64,
    pub uploads: u64,
}
