//! Resilient HTTP access to the fitness API
//!
//! [`ApiClient`] wraps every outbound call with:
//! - bearer authentication read from a [`TokenStore`] before each request
//! - retry with exponential backoff for transient failures
//! - a single diagnostic entry for every failure that reaches the caller
//!
//! It also offers concurrent [`batch`](ApiClient::batch) dispatch, streamed
//! uploads with progress and a [`health_check`](ApiClient::health_check)
//! probe that never fails.

pub mod auth;
pub mod batch;
pub mod envelope;
pub mod error;
pub mod request;
pub mod retry;
pub mod upload;

pub use auth::{MemoryTokenStore, NoToken, TokenStore};
pub use batch::BatchResult;
pub use envelope::ApiResponse;
pub use error::{ApiError, Result};
pub use request::RequestOptions;
pub use retry::{RetryPolicy, with_retry};
pub use upload::{ProgressCallback, ProgressTracker, UploadFile};

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::config::{ApiConfig, Config, RetryConfig};
use crate::logger::DiagnosticLogger;
use crate::observability::{ClientMetrics, MetricsSnapshot};

/// HTTP client for the fitness API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    health_path: String,
    tokens: Arc<dyn TokenStore>,
    logger: DiagnosticLogger,
    retry: RetryPolicy,
    metrics: Arc<ClientMetrics>,
}

impl ApiClient {
    pub fn new(
        api: &ApiConfig,
        retry: &RetryConfig,
        logger: DiagnosticLogger,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        Url::parse(&api.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", api.base_url, e)))?;

        let http = Client::builder()
            .connect_timeout(api.connect_timeout())
            .timeout(api.request_timeout())
            .user_agent(&api.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            health_path: api.health_path.clone(),
            tokens,
            logger,
            retry: RetryPolicy::from_config(retry),
            metrics: Arc::new(ClientMetrics::new()),
        })
    }

    /// Client with the token from `api.token`, if any
    pub fn from_config(config: &Config, logger: DiagnosticLogger) -> Result<Self> {
        let tokens = Arc::new(MemoryTokenStore::new(config.api.token.clone()));
        Self::new(&config.api, &config.retry, logger, tokens)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn logger(&self) -> &DiagnosticLogger {
        &self.logger
    }

    pub fn default_retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T>(&self, path: &str, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, None, options).await
    }

    /// POST with an optional JSON body. Use `None::<&()>` for an empty body.
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.encode(&Method::POST, path, body)?;
        self.request(Method::POST, path, body, options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.encode(&Method::PUT, path, body)?;
        self.request(Method::PUT, path, body, options).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.encode(&Method::PATCH, path, body)?;
        self.request(Method::PATCH, path, body, options).await
    }

    pub async fn delete<T>(&self, path: &str, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request(Method::DELETE, path, None, options).await
    }

    /// Run an arbitrary operation under `policy`.
    ///
    /// The failure that survives every attempt is recorded once and returned
    /// unchanged. Do not wrap the client's own request methods in this: they
    /// already retry with the client's default policy.
    pub async fn with_retry<T, F, Fut>(&self, operation: F, policy: &RetryPolicy) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (result, attempts) = retry::run(operation, policy).await;
        self.metrics.retried(u64::from(attempts.saturating_sub(1)));

        result.map_err(|e| self.report(None, e, attempts))
    }

    /// Dispatch all requests concurrently; see [`batch::batch`]
    pub async fn batch<T, Fut, I>(&self, requests: I) -> BatchResult<T>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T>>,
    {
        batch::batch(requests).await
    }

    /// Stream `file` as the `file` field of a multipart POST.
    ///
    /// `on_progress` sees a non-decreasing percentage that ends at 100 when
    /// the server accepts the upload. Uploads are not retried.
    pub async fn upload_file<T>(
        &self,
        path: &str,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        self.metrics.upload_started();

        let tracker = Arc::new(ProgressTracker::new(file.len(), on_progress));
        let result = self
            .send_upload(&url, file, tracker.clone())
            .await
            .and_then(|bytes| decode(&bytes));

        match result {
            Ok(value) => {
                tracker.finish();
                Ok(value)
            }
            Err(e) => Err(self.report(Some((&Method::POST, path)), e, 1)),
        }
    }

    /// Probe the liveness endpoint. Any failure yields `false`.
    pub async fn health_check(&self) -> bool {
        let url = self.url(&self.health_path);

        match self
            .send_once(Method::GET, &url, None, &RequestOptions::default())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(url, error = %e, "Health check failed");
                self.logger.debug(
                    "Health check failed",
                    Some(json!({ "url": url, "error": e.to_string() })),
                );
                false
            }
        }
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let policy = options.retry.clone().unwrap_or_else(|| self.retry.clone());

        let (result, attempts) = retry::run(
            || self.send_once(method.clone(), &url, body.clone(), &options),
            &policy,
        )
        .await;
        self.metrics.retried(u64::from(attempts.saturating_sub(1)));

        let bytes = result.map_err(|e| self.report(Some((&method, path)), e, attempts))?;
        let decoded = if options.unwrap_envelope {
            decode::<ApiResponse<T>>(&bytes).map(ApiResponse::into_data)
        } else {
            decode(&bytes)
        };
        decoded.map_err(|e| self.report(Some((&method, path)), e, attempts))
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        options: &RequestOptions,
    ) -> Result<Bytes> {
        debug!(%method, url, "Sending request");

        let request = request::decorate(self.http.request(method.clone(), url), self.tokens.token());
        let mut request = options.apply(request);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, mime::APPLICATION_JSON.essence_str())
                .body(body);
        }

        self.metrics.request_sent();
        let response = request.send().await?;
        let bytes = read_response(response).await?;

        debug!(%method, url, size = bytes.len(), "Request completed");
        Ok(bytes)
    }

    async fn send_upload(
        &self,
        url: &str,
        file: UploadFile,
        tracker: Arc<ProgressTracker>,
    ) -> Result<Bytes> {
        let total = file.len();
        debug!(url, file = %file.file_name, size = total, "Starting upload");

        let body = Body::wrap_stream(upload::body_stream(file.bytes, tracker));
        let part = Part::stream_with_length(body, total)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = request::decorate(self.http.post(url), self.tokens.token()).multipart(form);

        self.metrics.request_sent();
        let response = request.send().await?;
        read_response(response).await
    }

    fn encode<B>(&self, method: &Method, path: &str, body: Option<&B>) -> Result<Option<Bytes>>
    where
        B: Serialize + ?Sized,
    {
        body.map(|b| serde_json::to_vec(b).map(Bytes::from))
            .transpose()
            .map_err(|e| self.report(Some((method, path)), ApiError::Encode(e.to_string()), 0))
    }

    /// Record a failure that is about to reach the caller
    fn report(&self, request: Option<(&Method, &str)>, error: ApiError, attempts: u32) -> ApiError {
        self.metrics.failed();

        let mut data = json!({
            "code": error.code(),
            "error": error.to_string(),
            "attempts": attempts,
        });
        if let Some(status) = error.status() {
            data["status"] = json!(status);
        }

        let message = match request {
            Some((method, path)) => {
                data["method"] = json!(method.as_str());
                data["path"] = json!(path);
                "API request failed"
            }
            None => "Operation failed",
        };

        self.logger.log(error.log_level(), message, Some(data));
        error
    }
}

async fn read_response(response: Response) -> Result<Bytes> {
    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(ApiError::from_response(status, &body));
    }

    Ok(response.bytes().await?)
}

/// An empty body decodes as JSON `null`
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };

    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
