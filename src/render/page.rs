use crate::api::Article;
use crate::config::SiteInfo;
use crate::listing::{ListingState, MAX_ACCUMULATED_PAGES};
use crate::project::jsonld;
use crate::render::listing::{render_empty, render_list, Layout, UNTITLED};
use crate::render::locale::{DisplayLocale, TimestampStyle};
use crate::render::sources::{SourceMenu, UNKNOWN_SOURCE};
use crate::util::{escape_html, validate_link};
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Message for empty and failed listings and missing articles.
pub const NOTHING_FOUND: &str = "記事が見つかりませんでした。";
/// Label of the link to the next page of the full listing.
pub const LOAD_MORE: &str = "もっと見る";

/// Shared chrome for every HTML page: header navigation with the source
/// menu, footer links and the JSON-LD block.
pub struct PageShell<'a> {
    pub site: &'a SiteInfo,
    pub menu: &'a SourceMenu,
    pub locale: DisplayLocale,
}

impl<'a> PageShell<'a> {
    pub fn new(site: &'a SiteInfo, menu: &'a SourceMenu, locale: DisplayLocale) -> Self {
        Self { site, menu, locale }
    }

    pub fn home(&self) -> String {
        let site = self.site;
        let mut body = String::new();
        let _ = write!(
            body,
            "<h1>{}</h1>\n<p class=\"lead\">{}</p>\n",
            escape_html(&site.name),
            escape_html(&site.description)
        );
        body.push_str("<div class=\"cards\">\n");
        let _ = writeln!(
            body,
            r#"<a class="card" href="/articles/otani"><h2>最新ニュース</h2><p>{}に関する最新の記事をまとめています。</p></a>"#,
            escape_html(&site.topic_name)
        );
        body.push_str(
            "<a class=\"card\" href=\"/articles/all\"><h2>全記事一覧</h2><p>記事を網羅的にチェック。</p></a>\n",
        );
        body.push_str("</div>\n");

        self.wrap(None, json_ld(&jsonld::website(site)), &body)
    }

    /// Full listing of every page accumulated in `state`.
    ///
    /// The "more" link points at the first page not yet applied, so a page
    /// that failed is offered again.
    pub fn all_articles(&self, state: &ListingState) -> String {
        let title = "全記事一覧";
        let mut body = format!("<h1>{}</h1>\n", title);
        body.push_str(&self.listing_body(state, Layout::Stack, NOTHING_FOUND));

        let next = state.next_page();
        if state.has_more() && !state.phase().shows_nothing() && next < MAX_ACCUMULATED_PAGES {
            let _ = writeln!(
                body,
                r#"<div class="more"><a href="/articles/all?page={}">{}</a></div>"#,
                next, LOAD_MORE
            );
        }

        let list = jsonld::item_list(title, None, state.articles());
        self.wrap(Some(title), json_ld(&list), &body)
    }

    /// Topic listing as a card grid.
    pub fn topic(&self, state: &ListingState) -> String {
        let topic = &self.site.topic_name;
        let title = format!("{} 記事一覧", topic);
        let description = format!(
            "{}に関する最新ニュース記事をまとめています。",
            topic
        );
        let empty = format!("{}の記事が見つかりませんでした。", topic);

        let mut body = format!("<h1>{}</h1>\n", escape_html(&title));
        body.push_str(&self.listing_body(state, Layout::Grid, &empty));

        let list = jsonld::item_list(&title, Some(&description), state.articles());
        self.wrap(Some(&title), json_ld(&list), &body)
    }

    /// Listing of one source. The heading names the source from the menu,
    /// then from the first article, then falls back to a placeholder.
    pub fn source(&self, source_id: i64, state: &ListingState) -> String {
        let name = self
            .menu
            .name_of(source_id)
            .or_else(|| {
                state
                    .articles()
                    .first()
                    .and_then(|a| a.source_name.as_deref())
            })
            .unwrap_or(UNKNOWN_SOURCE);
        let title = format!("出典: {}", name);

        let mut body = format!("<h1>{}</h1>\n", escape_html(&title));
        body.push_str(&self.listing_body(state, Layout::Stack, NOTHING_FOUND));

        let list = jsonld::item_list(&title, None, state.articles());
        self.wrap(Some(&title), json_ld(&list), &body)
    }

    pub fn article(&self, article: &Article) -> String {
        let title = article.title.as_deref().unwrap_or(UNTITLED);
        let mut body = String::from("<article class=\"detail\">\n");
        let _ = writeln!(body, "<h1>{}</h1>", escape_html(title));
        if let Some(at) = &article.published_at {
            let _ = writeln!(
                body,
                r#"<p class="published"><time datetime="{}">{}</time></p>"#,
                escape_html(&at.to_rfc3339()),
                escape_html(&self.locale.format(at, TimestampStyle::DateTime))
            );
        }
        if let Some(excerpt) = &article.excerpt {
            let _ = writeln!(body, r#"<p class="excerpt">{}</p>"#, escape_html(excerpt));
        }
        if validate_link(&article.url).is_ok() {
            let _ = writeln!(
                body,
                r#"<a class="original" href="{}" target="_blank" rel="noopener noreferrer">元記事を読む</a>"#,
                escape_html(&article.url)
            );
        }
        body.push_str("</article>\n");

        self.wrap(
            Some(title),
            json_ld(&jsonld::news_article(article, true)),
            &body,
        )
    }

    pub fn not_found(&self) -> String {
        self.wrap(Some(NOTHING_FOUND), None, &render_empty(NOTHING_FOUND))
    }

    pub fn about(&self) -> String {
        let site = self.site;
        let mut body = String::from("<h1>運営者情報</h1>\n");
        let _ = writeln!(
            body,
            "<p>このサイトは{}のニュースをメインにまとめる非公式ファンサイトです。</p>",
            escape_html(&site.topic_name)
        );
        if let Some(operator) = &site.operator {
            let _ = writeln!(body, "<p>運営者: {}</p>", escape_html(operator));
        }
        if let Some(contact) = &site.contact {
            let _ = writeln!(body, "<p>連絡先: {}</p>", escape_html(contact));
        }
        self.wrap(Some("運営者情報"), None, &body)
    }

    pub fn privacy(&self) -> String {
        let body = "<h1>プライバシーポリシー</h1>\n\
            <p>当サイトでは広告配信およびアクセス解析のために Cookie を使用することがあります。</p>\n\
            <p>収集した情報は第三者に提供することはありません。</p>\n";
        self.wrap(Some("プライバシーポリシー"), None, body)
    }

    pub fn disclaimer(&self) -> String {
        let body = "<h1>免責事項</h1>\n\
            <p>当サイトに掲載する情報は正確性を期していますが、内容の正確性や安全性を保証するものではありません。</p>\n\
            <p>当サイトの情報利用により生じた損害について、一切の責任を負いかねますのでご了承ください。</p>\n";
        self.wrap(Some("免責事項"), None, body)
    }

    fn listing_body(&self, state: &ListingState, layout: Layout, empty_message: &str) -> String {
        if state.articles().is_empty() || state.phase().shows_nothing() {
            render_empty(empty_message)
        } else {
            render_list(state.articles(), &self.locale, layout)
        }
    }

    fn wrap(&self, title: Option<&str>, json_ld: Option<String>, body: &str) -> String {
        let site = self.site;
        let full_title = match title {
            Some(t) => format!("{} | {}", t, site.name),
            None => site.name.clone(),
        };
        let year = Utc::now().with_timezone(&self.locale.offset()).year();

        let mut html = String::with_capacity(body.len() + 2048);
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n\
             <meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{title}</title>\n\
             <meta name=\"description\" content=\"{description}\">\n\
             <link rel=\"alternate\" type=\"application/rss+xml\" title=\"{name}\" href=\"/rss.xml\">\n",
            lang = escape_html(&site.language),
            title = escape_html(&full_title),
            description = escape_html(&site.description),
            name = escape_html(&site.name),
        );
        if let Some(script) = json_ld {
            html.push_str(&script);
            html.push('\n');
        }
        html.push_str("</head>\n<body>\n<header>\n");
        let _ = writeln!(
            html,
            "<a class=\"site-name\" href=\"/\">{}</a>",
            escape_html(&site.name)
        );
        let _ = writeln!(
            html,
            "<nav><a href=\"/articles/otani\">{}記事</a><a href=\"/articles/all\">全記事</a>{}</nav>",
            escape_html(&site.topic_name),
            self.menu.render()
        );
        html.push_str("</header>\n<main>\n");
        html.push_str(body);
        html.push_str("</main>\n<footer>\n");
        html.push_str(
            "<ul class=\"site-info\"><li><a href=\"/about\">運営者情報</a></li>\
             <li><a href=\"/privacy\">プライバシーポリシー</a></li>\
             <li><a href=\"/disclaimer\">免責事項</a></li></ul>\n",
        );
        html.push_str("<p><a href=\"/rss.xml\">RSSフィード</a></p>\n");
        let _ = writeln!(
            html,
            "<p class=\"copyright\">© {} {}. All rights reserved.</p>",
            year,
            escape_html(&site.name)
        );
        html.push_str("</footer>\n</body>\n</html>\n");
        html
    }
}

fn json_ld<T: Serialize>(value: &T) -> Option<String> {
    match jsonld::script_tag(value) {
        Ok(tag) => Some(tag),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize JSON-LD, omitting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Source};
    use crate::config::Config;

    fn site() -> SiteInfo {
        Config::default().site()
    }

    fn menu() -> SourceMenu {
        SourceMenu::new(vec![Source {
            id: 3,
            name: "Example Sports".to_string(),
            icon_url: None,
        }])
    }

    fn loaded(articles: Vec<Article>) -> ListingState {
        let mut state = ListingState::new();
        let request = state.begin(0);
        state.complete(request, Ok(articles));
        state
    }

    fn twenty() -> Vec<Article> {
        (1..=20)
            .map(|id| Article::new(id, format!("https://example.com/{}", id)))
            .collect()
    }

    #[test]
    fn test_home_has_website_json_ld() {
        let site = site();
        let menu = menu();
        let html = PageShell::new(&site, &menu, DisplayLocale::japan()).home();
        assert!(html.contains("<script type=\"application/ld+json\">"));
        assert!(html.contains("\"@type\":\"WebSite\""));
        assert!(html.contains("href=\"/articles/otani\""));
        assert!(html.contains("<a href=\"/articles/source/3\">Example Sports</a>"));
        assert!(html.contains("href=\"/rss.xml\""));
    }

    #[test]
    fn test_all_articles_more_link_while_has_more() {
        let site = site();
        let menu = menu();
        let shell = PageShell::new(&site, &menu, DisplayLocale::japan());

        let html = shell.all_articles(&loaded(twenty()));
        assert!(html.contains("<a href=\"/articles/all?page=1\">もっと見る</a>"));

        let html = shell.all_articles(&loaded(twenty()[..7].to_vec()));
        assert!(!html.contains("もっと見る"));
    }

    #[test]
    fn test_failed_listing_renders_as_empty() {
        let site = site();
        let menu = SourceMenu::default();
        let mut state = ListingState::new();
        let request = state.begin(0);
        state.complete(request, Err(ApiError::Timeout));

        let html = PageShell::new(&site, &menu, DisplayLocale::japan()).topic(&state);
        assert!(html.contains("大谷翔平の記事が見つかりませんでした。"));
        assert!(html.contains("\"itemListElement\":[]"));
    }

    #[test]
    fn test_source_heading_resolution() {
        let site = site();
        let menu = menu();
        let shell = PageShell::new(&site, &menu, DisplayLocale::japan());

        let html = shell.source(3, &loaded(Vec::new()));
        assert!(html.contains("<h1>出典: Example Sports</h1>"));

        let from_article = Article {
            source_name: Some("Other".to_string()),
            ..Article::new(1, "https://example.com/1")
        };
        let html = shell.source(9, &loaded(vec![from_article]));
        assert!(html.contains("<h1>出典: Other</h1>"));

        let html = shell.source(10, &loaded(Vec::new()));
        assert!(html.contains("<h1>出典: 不明な出典</h1>"));
    }

    #[test]
    fn test_article_detail() {
        let site = site();
        let menu = menu();
        let article = Article {
            title: Some("Detail".to_string()),
            excerpt: Some("line one\nline two".to_string()),
            published_at: crate::api::parse_timestamp("2024-09-20T01:15:00Z", crate::api::japan_offset()),
            ..Article::new(5, "https://example.com/5")
        };
        let html = PageShell::new(&site, &menu, DisplayLocale::japan()).article(&article);
        assert!(html.contains("<h1>Detail</h1>"));
        assert!(html.contains(">2024/9/20 10:15:00</time>"));
        assert!(html.contains("元記事を読む"));
        assert!(html.contains("\"@type\":\"NewsArticle\""));
        assert!(html.contains("<title>Detail | Shohei Ohtani News</title>"));
    }

    #[test]
    fn test_about_uses_configured_operator() {
        let mut config = Config::default();
        config.operator = Some("Example Operator".to_string());
        let site = config.site();
        let menu = SourceMenu::default();
        let html = PageShell::new(&site, &menu, DisplayLocale::japan()).about();
        assert!(html.contains("<p>運営者: Example Operator</p>"));
        assert!(!html.contains("連絡先"));
    }
}
