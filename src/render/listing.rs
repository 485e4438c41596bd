use crate::api::Article;
use crate::render::locale::{DisplayLocale, TimestampStyle};
use crate::util::{escape_html, validate_link};
use std::fmt::Write;

/// Shown in place of a missing title.
pub const UNTITLED: &str = "(無題)";
/// Alt text of a thumbnail whose article has no title.
const THUMBNAIL_ALT: &str = "サムネイル";

/// Visual arrangement of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One entry per row with full date-time (all articles, per source).
    Stack,
    /// Card grid with date only (topic listing).
    Grid,
}

impl Layout {
    pub fn timestamp_style(self) -> TimestampStyle {
        match self {
            Layout::Stack => TimestampStyle::DateTime,
            Layout::Grid => TimestampStyle::Date,
        }
    }

    fn class(self) -> &'static str {
        match self {
            Layout::Stack => "listing listing-stack",
            Layout::Grid => "listing listing-grid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    /// RFC 3339, for the `datetime` attribute.
    pub machine: String,
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image<'a> {
    pub src: &'a str,
    pub alt: &'a str,
}

/// Source name, with its icon only when the provider sent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBadge<'a> {
    pub name: &'a str,
    pub icon: Option<&'a str>,
}

/// What one listing row shows, derived from an [`Article`] without
/// touching the record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry<'a> {
    pub id: i64,
    pub title: &'a str,
    /// `None` when the article URL is not a safe http(s) link.
    pub href: Option<&'a str>,
    pub excerpt: Option<&'a str>,
    pub timestamp: Option<Timestamp>,
    pub thumbnail: Option<Image<'a>>,
    pub badge: Option<SourceBadge<'a>>,
}

impl<'a> ListingEntry<'a> {
    pub fn project(article: &'a Article, locale: &DisplayLocale, style: TimestampStyle) -> Self {
        let title = article.title.as_deref().unwrap_or(UNTITLED);

        let href = if safe_url(&article.url) {
            Some(article.url.as_str())
        } else {
            tracing::debug!(id = article.id, url = %article.url, "Article link is not http(s), rendering without href");
            None
        };

        let timestamp = article.published_at.as_ref().map(|at| Timestamp {
            machine: at.to_rfc3339(),
            display: locale.format(at, style),
        });

        let thumbnail = article
            .thumbnail
            .as_deref()
            .filter(|src| safe_url(src))
            .map(|src| Image {
                src,
                alt: article.title.as_deref().unwrap_or(THUMBNAIL_ALT),
            });

        let badge = article.source_name.as_deref().map(|name| SourceBadge {
            name,
            icon: article.source_icon.as_deref().filter(|src| safe_url(src)),
        });

        Self {
            id: article.id,
            title,
            href,
            excerpt: article.excerpt.as_deref(),
            timestamp,
            thumbnail,
            badge,
        }
    }
}

fn safe_url(raw: &str) -> bool {
    validate_link(raw).is_ok()
}

/// Project `articles` in order.
pub fn project_entries<'a>(
    articles: &'a [Article],
    locale: &DisplayLocale,
    layout: Layout,
) -> Vec<ListingEntry<'a>> {
    let style = layout.timestamp_style();
    articles
        .iter()
        .map(|a| ListingEntry::project(a, locale, style))
        .collect()
}

/// Render a listing as an HTML `<ul>`.
pub fn render_list(articles: &[Article], locale: &DisplayLocale, layout: Layout) -> String {
    let entries = project_entries(articles, locale, layout);
    let mut html = String::with_capacity(entries.len() * 512);
    let _ = writeln!(html, r#"<ul class="{}">"#, layout.class());
    for entry in &entries {
        write_entry(&mut html, entry);
    }
    html.push_str("</ul>\n");
    html
}

/// The "nothing to show" block used for empty and failed listings.
pub fn render_empty(message: &str) -> String {
    format!("<p class=\"empty\">{}</p>\n", escape_html(message))
}

fn write_entry(html: &mut String, entry: &ListingEntry<'_>) {
    html.push_str("<li class=\"entry\">");
    match entry.href {
        Some(href) => {
            let _ = write!(
                html,
                r#"<a class="entry-link" href="{}" target="_blank" rel="noopener noreferrer">"#,
                escape_html(href)
            );
        }
        None => html.push_str(r#"<div class="entry-link">"#),
    }

    if let Some(img) = &entry.thumbnail {
        let _ = write!(
            html,
            r#"<img class="thumbnail" src="{}" alt="{}" loading="lazy">"#,
            escape_html(img.src),
            escape_html(img.alt)
        );
    }

    let _ = write!(
        html,
        r#"<div class="entry-body"><h2 class="entry-title">{}</h2>"#,
        escape_html(entry.title)
    );

    if entry.timestamp.is_some() || entry.badge.is_some() {
        html.push_str(r#"<div class="entry-meta">"#);
        if let Some(ts) = &entry.timestamp {
            let _ = write!(
                html,
                r#"<time datetime="{}">{}</time>"#,
                escape_html(&ts.machine),
                escape_html(&ts.display)
            );
        }
        if let Some(badge) = &entry.badge {
            html.push_str(r#"<span class="source-badge">"#);
            if let Some(icon) = badge.icon {
                let _ = write!(
                    html,
                    r#"<img class="source-icon" src="{}" alt="{}">"#,
                    escape_html(icon),
                    escape_html(badge.name)
                );
            }
            html.push_str(&escape_html(badge.name));
            html.push_str("</span>");
        }
        html.push_str("</div>");
    }

    if let Some(excerpt) = entry.excerpt {
        let _ = write!(html, r#"<p class="excerpt">{}</p>"#, escape_html(excerpt));
    }

    html.push_str("</div>");
    html.push_str(if entry.href.is_some() { "</a>" } else { "</div>" });
    html.push_str("</li>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{japan_offset, parse_timestamp};
    use pretty_assertions::assert_eq;

    fn example_article() -> Article {
        Article {
            title: Some("A".to_string()),
            ..Article::new(1, "http://x")
        }
    }

    #[test]
    fn test_example_article_entry() {
        let articles = vec![example_article()];
        let entries = project_entries(&articles, &DisplayLocale::japan(), Layout::Stack);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "A");
        assert_eq!(entries[0].href, Some("http://x"));
        assert!(entries[0].timestamp.is_none());
        assert!(entries[0].badge.is_none());
        assert!(entries[0].thumbnail.is_none());

        let html = render_list(&articles, &DisplayLocale::japan(), Layout::Stack);
        assert!(html.contains(r#"<h2 class="entry-title">A</h2>"#));
        assert!(!html.contains("<time"));
        assert!(!html.contains("source-badge"));
        assert!(!html.contains("<img"));
        assert!(html.contains(r#"target="_blank" rel="noopener noreferrer""#));
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let article = Article::new(2, "https://example.com/2");
        let entry = ListingEntry::project(&article, &DisplayLocale::japan(), TimestampStyle::Date);
        assert_eq!(entry.title, UNTITLED);
    }

    #[test]
    fn test_timestamp_formats_per_layout() {
        let article = Article {
            published_at: parse_timestamp("2024-09-20T01:15:00Z", japan_offset()),
            ..Article::new(3, "https://example.com/3")
        };
        let locale = DisplayLocale::japan();

        let stack = ListingEntry::project(&article, &locale, Layout::Stack.timestamp_style());
        let grid = ListingEntry::project(&article, &locale, Layout::Grid.timestamp_style());
        let stack_ts = stack.timestamp.unwrap();
        assert_eq!(stack_ts.display, "2024/9/20 10:15:00");
        assert_eq!(stack_ts.machine, "2024-09-20T01:15:00+00:00");
        assert_eq!(grid.timestamp.unwrap().display, "2024/9/20");
    }

    #[test]
    fn test_offsetless_timestamp_keeps_wall_clock() {
        let locale = DisplayLocale::japan();
        let article = Article {
            published_at: parse_timestamp("2024-09-20T10:15:00", locale.offset()),
            ..Article::new(3, "https://example.com/3")
        };

        let entry = ListingEntry::project(&article, &locale, TimestampStyle::DateTime);
        let ts = entry.timestamp.unwrap();
        assert_eq!(ts.display, "2024/9/20 10:15:00");
        assert_eq!(ts.machine, "2024-09-20T10:15:00+09:00");
    }

    #[test]
    fn test_badge_icon_requires_name() {
        let icon_only = Article {
            source_icon: Some("https://example.com/i.png".to_string()),
            ..Article::new(4, "https://example.com/4")
        };
        let entry = ListingEntry::project(&icon_only, &DisplayLocale::japan(), TimestampStyle::Date);
        assert!(entry.badge.is_none());

        let both = Article {
            source_name: Some("Example".to_string()),
            ..icon_only.clone()
        };
        let entry = ListingEntry::project(&both, &DisplayLocale::japan(), TimestampStyle::Date);
        assert_eq!(
            entry.badge,
            Some(SourceBadge {
                name: "Example",
                icon: Some("https://example.com/i.png"),
            })
        );
    }

    #[test]
    fn test_thumbnail_alt_falls_back() {
        let article = Article {
            thumbnail: Some("https://example.com/t.jpg".to_string()),
            ..Article::new(5, "https://example.com/5")
        };
        let entry = ListingEntry::project(&article, &DisplayLocale::japan(), TimestampStyle::Date);
        assert_eq!(
            entry.thumbnail,
            Some(Image {
                src: "https://example.com/t.jpg",
                alt: "サムネイル",
            })
        );
    }

    #[test]
    fn test_unsafe_link_has_no_href() {
        let articles = vec![Article::new(6, "javascript:alert(1)")];
        let html = render_list(&articles, &DisplayLocale::japan(), Layout::Grid);
        assert!(!html.contains("href="));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_text_is_escaped() {
        let articles = vec![Article {
            title: Some("<script>x</script>".to_string()),
            excerpt: Some("a & b".to_string()),
            ..Article::new(7, "https://example.com/?a=1&b=2")
        }];
        let html = render_list(&articles, &DisplayLocale::japan(), Layout::Stack);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("https://example.com/?a=1&amp;b=2"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_order_preserved() {
        let articles: Vec<Article> = [30, 10, 20]
            .iter()
            .map(|&id| Article::new(id, format!("https://example.com/{}", id)))
            .collect();
        let entries = project_entries(&articles, &DisplayLocale::japan(), Layout::Stack);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(
            render_empty("記事が見つかりませんでした。"),
            "<p class=\"empty\">記事が見つかりませんでした。</p>\n"
        );
    }
}
