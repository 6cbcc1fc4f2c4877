// src/fetch.rs
// =============================================================================
// The HTTP fetch collaborator.
//
// The crawler never builds its own HTTP client; it consumes a Fetcher that
// the caller injects at construction time. This keeps the core free of
// transport policy (timeouts, retries, rate limiting all live behind the
// trait) and makes the traversal loop testable against a canned fetcher.
//
// HttpFetcher is the reqwest-backed implementation the CLI wires in.
// =============================================================================

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

/// A fetched page: the HTTP status and the response body.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    /// The crawler only follows links out of plain 200 responses.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// HTTP transport seam consumed by the crawler.
///
/// Implementations own all transport policy. Errors returned here are opaque
/// to the core: it performs no retry or backoff and unwinds them out of
/// `crawl()` unchanged.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET request for `url`.
    async fn request(&self, url: &str) -> Result<PageResponse>;
}

/// Default Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with a 10 second timeout and a bounded redirect
    /// chain.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps a caller-configured client (custom user agent, proxy, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn request(&self, url: &str) -> Result<PageResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        // An unreadable body is treated as empty; downstream that means a
        // page with zero candidate links, not an error.
        let body = response.text().await.unwrap_or_default();
        Ok(PageResponse { status, body })
    }
}
