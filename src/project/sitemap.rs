use crate::api::{Article, SITEMAP_LIMIT};
use crate::config::SiteInfo;
use crate::project::xml::XmlDoc;
use anyhow::Result;
use chrono::NaiveDate;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub const SITEMAP_CONTENT_TYPE: &str = "application/xml";

/// Render `sitemap.xml`: the site root, then one detail page per article.
///
/// Articles without a publication date use `today` as `lastmod`.
pub fn render_sitemap(site: &SiteInfo, articles: &[Article], today: NaiveDate) -> Result<String> {
    let mut doc = XmlDoc::new()?;
    doc.start("urlset", &[("xmlns", SITEMAP_NS)])?;

    write_url(&mut doc, &site.absolute("/"), today, "daily", "1.0")?;

    for article in articles.iter().take(SITEMAP_LIMIT as usize) {
        let lastmod = article
            .published_at
            .map(|at| at.date_naive())
            .unwrap_or(today);
        let loc = site.absolute(&format!("/articles/{}", article.id));
        write_url(&mut doc, &loc, lastmod, "weekly", "0.8")?;
    }

    doc.end("urlset")?;
    doc.finish()
}

fn write_url(
    doc: &mut XmlDoc,
    loc: &str,
    lastmod: NaiveDate,
    changefreq: &str,
    priority: &str,
) -> Result<()> {
    doc.start("url", &[])?;
    doc.text_element("loc", loc)?;
    doc.text_element("lastmod", &lastmod.format("%Y-%m-%d").to_string())?;
    doc.text_element("changefreq", changefreq)?;
    doc.text_element("priority", priority)?;
    doc.end("url")
}
