//! Machine-readable projections of article records: schema.org JSON-LD,
//! RSS 2.0 and the sitemap.

pub mod jsonld;
mod rss;
mod sitemap;
mod xml;

pub use rss::{render_rss, RSS_CONTENT_TYPE, UNKNOWN_SOURCE_LABEL};
pub use sitemap::{render_sitemap, SITEMAP_CONTENT_TYPE};
