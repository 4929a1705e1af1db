use bon::Builder;
use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use super::retry::RetryPolicy;
use crate::logger::entry::now_millis;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Per-call extras
///
/// ```
/// use fittrack::client::RequestOptions;
///
/// let options = RequestOptions::builder()
///     .query(vec![("page".to_string(), "2".to_string())])
///     .build();
/// assert!(options.headers.is_empty());
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct RequestOptions {
    #[builder(default)]
    pub headers: Vec<(String, String)>,
    #[builder(default)]
    pub query: Vec<(String, String)>,
    /// Overrides the client's default policy for this call
    pub retry: Option<RetryPolicy>,
    /// Decode the body as an [`ApiResponse`](super::ApiResponse) and return its `data`
    #[builder(default)]
    pub unwrap_envelope: bool,
}

impl RequestOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn enveloped(mut self) -> Self {
        self.unwrap_envelope = true;
        self
    }

    pub(crate) fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        request
    }
}

/// `<ms>-<9 chars>`, unique per request for server-side correlation
pub fn request_id() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(9);
    format!("{}-{}", now_millis(), suffix)
}

/// Headers carried by every outbound request
pub(crate) fn decorate(mut request: RequestBuilder, token: Option<String>) -> RequestBuilder {
    if let Some(token) = token {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    request = request
        .header(ACCEPT, mime::APPLICATION_JSON.essence_str())
        .header(REQUEST_ID_HEADER, request_id());

    if let Ok(stamp) = OffsetDateTime::now_utc().format(&Rfc3339) {
        request = request.header(TIMESTAMP_HEADER, stamp);
    }

    request
}
