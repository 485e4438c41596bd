use crate::api::types::{japan_offset, Article, ArticleRecord, ListingScope, Source};
use chrono::FixedOffset;
use futures::StreamExt;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Fixed listing page size.
pub const PAGE_SIZE: u32 = 20;
/// Maximum number of items in the RSS document.
pub const RSS_ITEM_LIMIT: u32 = 50;
/// Maximum number of article URLs in the sitemap.
pub const SITEMAP_LIMIT: u32 = 1000;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Offset of a zero-based page index.
pub fn page_offset(page: u32) -> u64 {
    u64::from(page) * u64::from(PAGE_SIZE)
}

/// Errors that can occur while talking to the article provider.
///
/// Every variant is recoverable: pages degrade to their empty rendering and
/// nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not JSON of the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Endpoint URL could not be built from the base URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification used for logging at the page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Decode(_) => FailureKind::Decode,
            ApiError::Network(e) if e.is_decode() => FailureKind::Decode,
            ApiError::Network(_)
            | ApiError::Timeout
            | ApiError::HttpStatus(_)
            | ApiError::ResponseTooLarge
            | ApiError::InvalidUrl(_) => FailureKind::Transport,
        }
    }
}

/// Create a redirect policy with loop detection and limited hops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Typed client for the article provider.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
/// Timestamps the provider sends without an offset are read in
/// `local_offset` (Japan time unless overridden).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
    local_offset: FixedOffset,
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `https://example.com/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .build()?;
        Self::with_http(http, base_url, timeout)
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http,
            base,
            timeout,
            local_offset: japan_offset(),
        })
    }

    /// Offset used for provider timestamps that carry none.
    pub fn with_local_offset(mut self, offset: FixedOffset) -> Self {
        self.local_offset = offset;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /articles?limit&offset`
    pub async fn list_articles(&self, limit: u32, offset: u64) -> Result<Vec<Article>, ApiError> {
        self.list(ListingScope::All, limit, offset).await
    }

    /// `GET /articles/otani?limit&offset`
    pub async fn list_topic_articles(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Article>, ApiError> {
        self.list(ListingScope::Topic, limit, offset).await
    }

    /// `GET /articles/by-source/{id}?limit&offset`
    pub async fn list_articles_by_source(
        &self,
        source_id: i64,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Article>, ApiError> {
        self.list(ListingScope::Source(source_id), limit, offset)
            .await
    }

    /// Fetch one page of `scope` using the fixed page size.
    pub async fn fetch_page(
        &self,
        scope: ListingScope,
        page: u32,
    ) -> Result<Vec<Article>, ApiError> {
        self.list(scope, PAGE_SIZE, page_offset(page)).await
    }

    /// `GET /articles/{id}`. A 404 from the provider is `Ok(None)`.
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>, ApiError> {
        let url = self.base.join(&format!("articles/{}", id))?;
        match self.get_json::<ArticleRecord>(url).await {
            Ok(record) => Ok(Some(record.into_article(self.local_offset))),
            Err(ApiError::HttpStatus(404)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `GET /sources`
    pub async fn list_sources(&self) -> Result<Vec<Source>, ApiError> {
        let url = self.base.join("sources")?;
        self.get_json(url).await
    }

    async fn list(
        &self,
        scope: ListingScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Article>, ApiError> {
        let mut url = self.base.join(&scope.path())?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        let records: Vec<ArticleRecord> = self.get_json(url).await?;
        Ok(records
            .into_iter()
            .map(|record| record.into_article(self.local_offset))
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "Requesting provider");

        let response = tokio::time::timeout(self.timeout, self.http.get(url.clone()).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "Provider returned error status");
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        let bytes = tokio::time::timeout(
            self.timeout,
            read_limited_bytes(response, MAX_RESPONSE_SIZE),
        )
        .await
        .map_err(|_| ApiError::Timeout)??;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ApiError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
