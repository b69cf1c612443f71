//! Upstream HTTP fetch primitive.
//!
//! ### Contract
//! - One request descriptor in, one response descriptor out.
//! - Non-success statuses are NOT errors: a 404 or 301 comes back as a
//!   response descriptor for the strategy engine to deliver unmodified.
//!   [`FetchError`] is reserved for transport-level failure (unreachable,
//!   timed out, body over the byte limit), which is what triggers a
//!   strategy's cache fallback.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

pub use url::{UrlError, canonicalize, resolve_path};

use wayside_core::{RequestDescriptor, ResponseDescriptor};

/// Error type for transport-level fetch failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("unsupported method: {0}")]
    Method(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("response body {size} bytes exceeds limit {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "wayside/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "wayside/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// The network-fetch primitive the strategy engine is built over.
///
/// Production uses [`HttpFetcher`]; tests inject fakes with programmable
/// responses and failure injection.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, FetchError>;
}

/// HTTP fetch client backed by reqwest.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, FetchError> {
        let start = Instant::now();

        let method: reqwest::Method = request
            .method
            .parse()
            .map_err(|_| FetchError::Method(request.method.clone()))?;

        let response = self
            .http
            .request(method, request.url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(FetchError::TooLarge { size: len as usize, limit: self.config.max_bytes });
        }

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if body.len() > self.config.max_bytes {
            return Err(FetchError::TooLarge { size: body.len(), limit: self.config.max_bytes });
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            request.url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseDescriptor { status, headers, body })
    }
}
