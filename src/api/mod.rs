//! Client for the article data provider.
//!
//! The provider is an external HTTP API serving JSON arrays of article and
//! source records. This module only consumes it:
//!
//! - [`types`] - Article/Source records and their decode-time normalization
//! - [`client`] - [`ApiClient`], one method per provider endpoint, and the
//!   [`ApiError`] failure taxonomy
//!
//! # Example
//!
//! ```ignore
//! use matome::api::{ApiClient, ListingScope};
//!
//! let client = ApiClient::new("https://example.com/api", Duration::from_secs(30))?;
//! let first_page = client.fetch_page(ListingScope::All, 0).await?;
//! ```

mod client;
mod types;

pub use client::{
    page_offset, ApiClient, ApiError, FailureKind, PAGE_SIZE, RSS_ITEM_LIMIT, SITEMAP_LIMIT,
};
pub use types::{japan_offset, parse_timestamp, Article, ListingScope, Source};
