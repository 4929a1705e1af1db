//! Streamed multipart upload with progress reporting

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, Stream};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use super::error::{ApiError, Result};

/// Bytes handed to the transport per stream item
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Receives upload progress in percent, 0..=100
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// File content to upload as the `file` multipart field
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ApiError::Io(format!("not a file: {}", path.display())))?;

        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn guess_content_type(file_name: &str) -> mime::Mime {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" => mime::APPLICATION_JSON,
        "txt" | "log" => mime::TEXT_PLAIN,
        "csv" => mime::TEXT_CSV,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Converts transmitted byte counts into a non-decreasing percentage
pub struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    last: AtomicU8,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            last: AtomicU8::new(0),
            callback,
        }
    }

    /// Record `n` more bytes handed to the transport
    pub fn advance(&self, n: u64) {
        let sent = self.sent.fetch_add(n, Ordering::SeqCst) + n;
        self.report(percent(sent, self.total));
    }

    /// The server accepted the upload
    pub fn finish(&self) {
        self.report(100);
    }

    pub fn last_reported(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }

    fn report(&self, pct: u8) {
        let previous = self.last.fetch_max(pct, Ordering::SeqCst);
        if pct > previous {
            if let Some(callback) = &self.callback {
                callback(pct);
            }
        }
    }
}

/// Rounds down, so 100 only appears once every byte is out
fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = sent.min(total) as u128 * 100 / total as u128;
    pct as u8
}

/// Chunked body stream that advances `tracker` as the transport pulls it
pub(crate) fn body_stream(
    bytes: Bytes,
    tracker: Arc<ProgressTracker>,
) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len())))
        .collect();

    stream::iter(chunks).map(move |chunk| {
        tracker.advance(chunk.len() as u64);
        Ok(chunk)
    })
}
