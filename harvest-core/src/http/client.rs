//! HTTP client trait and implementations.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::FetchError;

use super::headers::HeaderSet;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a single GET and parse the body as JSON. Never retries.
    async fn fetch_json(&self, url: &str, headers: &HeaderSet) -> Result<JsonValue, FetchError>;
}

/// Configuration for ApiClient.
#[derive(Clone)]
pub struct ApiClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("specialist-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(ApiClient { inner })
    }
}

/// Production client for the directory API.
pub struct ApiClient {
    inner: reqwest::Client,
}

impl ApiClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        ApiClientBuilder::new().build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }
}

#[async_trait]
impl HttpClient for ApiClient {
    async fn fetch_json(&self, url: &str, headers: &HeaderSet) -> Result<JsonValue, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let mut request = self.inner.get(parsed);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        tracing::debug!(url, "network: fetching");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = %status, "network: request failed");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(url, status = %status, bytes = bytes.len(), "network: fetched");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Json(JsonValue),
    /// Raw body, for malformed-JSON cases.
    Body(String),
    Status(u16),
    Error(String),
}

/// Mock HTTP client for testing. Records every URL it is asked for.
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_json(self, url: &str, body: JsonValue) -> Self {
        self.with_response(url, MockResponse::Json(body))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_json(&self, url: &str, _headers: &HeaderSet) -> Result<JsonValue, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.responses.get(url) {
            Some(MockResponse::Json(body)) => Ok(body.clone()),
            Some(MockResponse::Body(body)) => Ok(serde_json::from_str(body)?),
            Some(MockResponse::Status(status)) => Err(FetchError::HttpStatus {
                status: *status,
                url: url.to_string(),
            }),
            Some(MockResponse::Error(e)) => Err(FetchError::Transport(e.clone())),
            None => Err(FetchError::Transport(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}
