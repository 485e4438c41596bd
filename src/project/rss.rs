use crate::api::{Article, RSS_ITEM_LIMIT};
use crate::config::SiteInfo;
use crate::project::xml::XmlDoc;
use crate::render::UNTITLED;
use anyhow::Result;

/// Source shown for items whose provider record has none.
pub const UNKNOWN_SOURCE_LABEL: &str = "不明";

/// Content type of the feed response.
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Render an RSS 2.0 document for the newest `articles`.
///
/// At most [`RSS_ITEM_LIMIT`] items are written, in input order. An empty
/// slice produces a channel with no items.
pub fn render_rss(site: &SiteInfo, articles: &[Article]) -> Result<String> {
    let mut doc = XmlDoc::new()?;

    doc.start("rss", &[("version", "2.0")])?;
    doc.start("channel", &[])?;
    doc.text_element("title", &site.name)?;
    doc.text_element("link", &site.absolute("/"))?;
    doc.text_element("description", &site.description)?;
    doc.text_element("language", &site.language)?;

    for article in articles.iter().take(RSS_ITEM_LIMIT as usize) {
        write_item(&mut doc, article)?;
    }

    doc.end("channel")?;
    doc.end("rss")?;
    doc.finish()
}

fn write_item(doc: &mut XmlDoc, article: &Article) -> Result<()> {
    let pub_date = article
        .published_at
        .map(|at| at.to_rfc2822())
        .unwrap_or_default();

    doc.start("item", &[])?;
    doc.cdata_element("title", article.title.as_deref().unwrap_or(UNTITLED))?;
    doc.text_element("link", &article.url)?;
    doc.cdata_element("description", article.excerpt.as_deref().unwrap_or(""))?;
    doc.text_element("pubDate", &pub_date)?;
    doc.cdata_element(
        "source",
        article.source_name.as_deref().unwrap_or(UNKNOWN_SOURCE_LABEL),
    )?;
    doc.text_element_with("guid", &[("isPermaLink", "false")], &article.id.to_string())?;
    doc.end("item")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{japan_offset, parse_timestamp};
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    fn site() -> SiteInfo {
        Config::default().site()
    }

    fn article(id: i64) -> Article {
        Article {
            title: Some(format!("Article {}", id)),
            excerpt: Some("Summary".to_string()),
            published_at: parse_timestamp("2024-09-20T10:15:00+09:00", japan_offset()),
            source_name: Some("Example".to_string()),
            ..Article::new(id, format!("https://example.com/{}", id))
        }
    }

    #[test]
    fn test_zero_articles_is_well_formed() {
        let xml = render_rss(&site(), &[]).unwrap();
        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert!(feed.entries.is_empty());
        assert_eq!(feed.title.unwrap().content, "Shohei Ohtani News");
        assert!(xml.contains("<language>ja</language>"));
    }

    #[test]
    fn test_items_parse_back() {
        let xml = render_rss(&site(), &[article(1), article(2)]).unwrap();
        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();

        assert_eq!(feed.entries.len(), 2);
        let first = &feed.entries[0];
        assert_eq!(first.title.as_ref().unwrap().content, "Article 1");
        assert_eq!(first.links[0].href, "https://example.com/1");
        assert_eq!(
            first.published.unwrap().timestamp(),
            parse_timestamp("2024-09-20T10:15:00+09:00", japan_offset()).unwrap().timestamp()
        );
        assert!(xml.contains(r#"<guid isPermaLink="false">1</guid>"#));
    }

    #[test]
    fn test_absent_fields_use_fallbacks() {
        let xml = render_rss(&site(), &[Article::new(5, "https://example.com/5")]).unwrap();
        assert!(xml.contains("<title><![CDATA[(無題)]]></title>"), "{}", xml);
        assert!(xml.contains("<description><![CDATA[]]></description>"), "{}", xml);
        assert!(xml.contains("<pubDate></pubDate>"), "{}", xml);
        assert!(xml.contains("<source><![CDATA[不明]]></source>"), "{}", xml);

        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert!(feed.entries[0].published.is_none());
    }

    #[test]
    fn test_item_limit() {
        let articles: Vec<Article> = (1..=60).map(article).collect();
        let xml = render_rss(&site(), &articles).unwrap();
        assert_eq!(xml.matches("<item>").count(), 50);
    }

    #[test]
    fn test_markup_in_title_stays_in_cdata() {
        let hostile = Article {
            title: Some("<b>bold</b> ]]> & more".to_string()),
            ..article(9)
        };
        let xml = render_rss(&site(), &[hostile]).unwrap();
        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert!(xml.contains("]]]]><![CDATA[>"));
    }
}
