use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const JAPAN_OFFSET_SECONDS: i32 = 9 * 3600;

/// UTC+09:00, the zone the provider writes offset-less timestamps in.
pub fn japan_offset() -> FixedOffset {
    FixedOffset::east_opt(JAPAN_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

// ============================================================================
// Provider Records
// ============================================================================

/// An article record as served by the provider, after normalization.
///
/// Optional text fields are normalized on decode: absent, `null` and
/// blank values all become `None`. `published_at` that cannot be read as a
/// timestamp also becomes `None` instead of failing the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Wire form of [`Article`]. The timestamp stays raw until the client
/// resolves it against its local offset.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticleRecord {
    id: i64,
    #[serde(default, deserialize_with = "de_opt_text")]
    title: Option<String>,
    url: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    excerpt: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    published_at: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    source_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    source_icon: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    thumbnail: Option<String>,
}

impl ArticleRecord {
    /// Normalize into an [`Article`], reading offset-less timestamps in `local`.
    pub(crate) fn into_article(self, local: FixedOffset) -> Article {
        Article {
            id: self.id,
            title: self.title,
            url: self.url,
            excerpt: self.excerpt,
            published_at: self
                .published_at
                .as_deref()
                .and_then(|raw| parse_timestamp(raw, local)),
            source_name: self.source_name,
            source_icon: self.source_icon,
            thumbnail: self.thumbnail,
        }
    }
}

impl Article {
    /// Minimal record with every optional field absent.
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            title: None,
            url: url.into(),
            excerpt: None,
            published_at: None,
            source_name: None,
            source_icon: None,
            thumbnail: None,
        }
    }
}

/// A known article source, used to build the filter menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

// ============================================================================
// Listing Scope
// ============================================================================

/// Which provider listing a page is paging through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// `GET /articles`: every article, newest first.
    All,
    /// `GET /articles/otani`: the topic-filtered listing.
    Topic,
    /// `GET /articles/by-source/{id}`.
    Source(i64),
}

impl ListingScope {
    /// Path of the listing relative to the provider base URL.
    pub fn path(&self) -> String {
        match self {
            ListingScope::All => "articles".to_string(),
            ListingScope::Topic => "articles/otani".to_string(),
            ListingScope::Source(id) => format!("articles/by-source/{}", id),
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    }))
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DD[T ]HH:MM:SS[.f]`. Naive values
/// carry no offset and are read as wall-clock time in `local`.
/// Anything else yields `None`.
pub fn parse_timestamp(raw: &str, local: FixedOffset) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return local.from_local_datetime(&naive).single();
        }
    }

    tracing::debug!(value = %raw, "Unparseable published_at, treating as absent");
    None
}
