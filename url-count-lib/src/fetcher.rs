//! HTTP fetching.
//!
//! The rest of the crate only sees the [`Fetch`] capability: GET a URL and
//! hand back the whole body. [`HttpFetcher`] is the reqwest-backed
//! implementation used by the CLI; tests plug in their own.

use crate::error::UrlCountError;
use crate::types::CountConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use std::time::Duration;

/// Capability to GET a URL and return its full response body.
///
/// A single failed attempt is final: implementations must not retry.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Bytes, UrlCountError>;
}

/// reqwest-backed fetcher shared by every processing task.
///
/// Response compression is off so body length matches wire bytes, and the
/// idle pool is sized to the concurrency limit.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    /// HTTP client; internally pooled and safe to share
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default pool settings.
    pub fn new() -> Result<Self, UrlCountError> {
        Self::with_config(&CountConfig::default())
    }

    /// Create a fetcher whose pool matches `config`.
    pub fn with_config(config: &CountConfig) -> Result<Self, UrlCountError> {
        Self::with_pool(config.concurrency, config.idle_timeout)
    }

    /// Create a fetcher keeping at most `max_idle` idle connections per host,
    /// each for at most `idle_timeout`.
    pub fn with_pool(max_idle: usize, idle_timeout: Duration) -> Result<Self, UrlCountError> {
        let http_client = reqwest::Client::builder()
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .pool_max_idle_per_host(max_idle)
            .pool_idle_timeout(idle_timeout)
            .user_agent(concat!("url-count/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                UrlCountError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<Bytes, UrlCountError> {
        let response = self.http_client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            // Non-2xx bodies are still counted.
            tracing::debug!(%url, %status, "non-success status");
        }

        Ok(response.bytes().await?)
    }
}
