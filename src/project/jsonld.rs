//! schema.org JSON-LD documents.
//!
//! Every optional property is omitted when absent. Output never contains
//! `null` or placeholder strings.

use crate::api::Article;
use crate::config::SiteInfo;
use crate::util::script_safe_json;
use serde::{Deserialize, Serialize};

const SCHEMA_CONTEXT: &str = "https://schema.org";
const SEARCH_QUERY_INPUT: &str = "required name=search_term_string";

fn schema_context() -> String {
    SCHEMA_CONTEXT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemList {
    #[serde(rename = "@context", default = "schema_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always present, `[]` for an empty listing.
    #[serde(default)]
    pub item_list_element: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: String,
    /// 1-based.
    pub position: usize,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<NewsArticle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(rename = "@type")]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Organization>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    #[serde(rename = "@type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSite {
    #[serde(rename = "@context", default = "schema_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub publisher: Organization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_action: Option<SearchAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAction {
    #[serde(rename = "@type")]
    pub kind: String,
    pub target: String,
    #[serde(rename = "query-input")]
    pub query_input: String,
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `NewsArticle` for one article. `with_context` adds `@context` for use as
/// a top-level document.
pub fn news_article(article: &Article, with_context: bool) -> NewsArticle {
    NewsArticle {
        context: with_context.then(schema_context),
        kind: "NewsArticle".to_string(),
        url: article.url.clone(),
        headline: article.title.clone(),
        description: article.excerpt.clone(),
        date_published: article.published_at.map(|at| at.to_rfc3339()),
        image: article.thumbnail.clone(),
        publisher: article.source_name.as_ref().map(|name| Organization {
            kind: "Organization".to_string(),
            name: name.clone(),
            url: None,
            logo: article.source_icon.as_ref().map(|icon| ImageObject {
                kind: "ImageObject".to_string(),
                url: icon.clone(),
            }),
        }),
    }
}

/// `ItemList` over `articles`, positions starting at 1.
pub fn item_list(name: &str, description: Option<&str>, articles: &[Article]) -> ItemList {
    ItemList {
        context: schema_context(),
        kind: "ItemList".to_string(),
        name: non_empty(name),
        description: description.and_then(non_empty),
        item_list_element: articles
            .iter()
            .enumerate()
            .map(|(i, article)| ListItem {
                kind: "ListItem".to_string(),
                position: i + 1,
                url: article.url.clone(),
                name: article.title.clone(),
                item: Some(news_article(article, false)),
            })
            .collect(),
    }
}

/// `WebSite` describing this site.
pub fn website(site: &SiteInfo) -> WebSite {
    WebSite {
        context: schema_context(),
        kind: "WebSite".to_string(),
        name: site.name.clone(),
        url: site.absolute("/"),
        description: non_empty(&site.description),
        publisher: Organization {
            kind: "Organization".to_string(),
            name: site
                .operator
                .as_deref()
                .and_then(non_empty)
                .unwrap_or_else(|| site.name.clone()),
            url: Some(site.absolute("/")),
            logo: site.logo_url.as_deref().and_then(non_empty).map(|url| ImageObject {
                kind: "ImageObject".to_string(),
                url,
            }),
        },
        potential_action: site
            .search_url_template
            .as_deref()
            .and_then(non_empty)
            .map(|target| SearchAction {
                kind: "SearchAction".to_string(),
                target,
                query_input: SEARCH_QUERY_INPUT.to_string(),
            }),
    }
}

/// Serialize `value` into a `<script type="application/ld+json">` element.
pub fn script_tag<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(format!(
        "<script type=\"application/ld+json\">{}</script>",
        script_safe_json(&json)
    ))
}
