use crate::api::{ApiClient, ListingScope, RSS_ITEM_LIMIT, SITEMAP_LIMIT};
use crate::listing::{load_through, MAX_ACCUMULATED_PAGES};
use crate::project::{render_rss, render_sitemap, RSS_CONTENT_TYPE, SITEMAP_CONTENT_TYPE};
use crate::render::{PageShell, SourceMenu};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Requested page index. Missing or malformed values mean page 0;
    /// large values are clamped to the accumulation cap.
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0)
            .min(MAX_ACCUMULATED_PAGES - 1)
    }
}

/// Fetch the source menu. Failures degrade to an empty menu.
async fn load_menu(client: &ApiClient) -> SourceMenu {
    match client.list_sources().await {
        Ok(sources) => SourceMenu::new(sources),
        Err(e) => {
            tracing::warn!(error = %e, kind = ?e.kind(), "Failed to load sources, menu will be empty");
            SourceMenu::default()
        }
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

pub async fn home(State(state): State<Arc<AppState>>) -> Response {
    let menu = load_menu(&state.client).await;
    let shell = PageShell::new(&state.site, &menu, state.locale);
    Html(shell.home()).into_response()
}

pub async fn all_articles(
    State(state): State<Arc<AppState>>,
    query: Option<Query<PageQuery>>,
) -> Response {
    // A query string the extractor rejects (e.g. a repeated key) means page 0
    let page = query.map(|Query(query)| query.page()).unwrap_or(0);
    let (menu, listing) = tokio::join!(
        load_menu(&state.client),
        load_through(&state.client, ListingScope::All, page)
    );
    tracing::debug!(page = page, articles = listing.articles().len(), has_more = listing.has_more(), "Rendered full listing");

    let shell = PageShell::new(&state.site, &menu, state.locale);
    Html(shell.all_articles(&listing)).into_response()
}

pub async fn topic_articles(State(state): State<Arc<AppState>>) -> Response {
    let (menu, listing) = tokio::join!(
        load_menu(&state.client),
        load_through(&state.client, ListingScope::Topic, 0)
    );
    let shell = PageShell::new(&state.site, &menu, state.locale);
    Html(shell.topic(&listing)).into_response()
}

pub async fn source_articles(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(source_id) = parse_id(&raw_id) else {
        return not_found(State(state)).await;
    };

    let (menu, listing) = tokio::join!(
        load_menu(&state.client),
        load_through(&state.client, ListingScope::Source(source_id), 0)
    );
    let shell = PageShell::new(&state.site, &menu, state.locale);
    Html(shell.source(source_id, &listing)).into_response()
}

pub async fn article_detail(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return not_found(State(state)).await;
    };

    let (menu, fetched) = tokio::join!(load_menu(&state.client), state.client.get_article(id));
    let shell = PageShell::new(&state.site, &menu, state.locale);

    match fetched {
        Ok(Some(article)) => Html(shell.article(&article)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Html(shell.not_found())).into_response(),
        Err(e) => {
            tracing::error!(id = id, error = %e, kind = ?e.kind(), "Failed to load article");
            (StatusCode::BAD_GATEWAY, Html(shell.not_found())).into_response()
        }
    }
}

pub async fn rss_feed(State(state): State<Arc<AppState>>) -> Response {
    let articles = match state.client.list_articles(RSS_ITEM_LIMIT, 0).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "Failed to load articles for RSS, serving empty feed");
            Vec::new()
        }
    };

    match render_rss(&state.site, &articles) {
        Ok(xml) => ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], xml).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render RSS");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn sitemap(State(state): State<Arc<AppState>>) -> Response {
    let articles = match state.client.list_articles(SITEMAP_LIMIT, 0).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "Failed to load articles for sitemap, listing root only");
            Vec::new()
        }
    };
    let today = Utc::now().with_timezone(&state.locale.offset()).date_naive();

    match render_sitemap(&state.site, &articles, today) {
        Ok(xml) => ([(header::CONTENT_TYPE, SITEMAP_CONTENT_TYPE)], xml).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render sitemap");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn about(State(state): State<Arc<AppState>>) -> Response {
    let menu = load_menu(&state.client).await;
    Html(PageShell::new(&state.site, &menu, state.locale).about()).into_response()
}

pub async fn privacy(State(state): State<Arc<AppState>>) -> Response {
    let menu = load_menu(&state.client).await;
    Html(PageShell::new(&state.site, &menu, state.locale).privacy()).into_response()
}

pub async fn disclaimer(State(state): State<Arc<AppState>>) -> Response {
    let menu = load_menu(&state.client).await;
    Html(PageShell::new(&state.site, &menu, state.locale).disclaimer()).into_response()
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    let menu = load_menu(&state.client).await;
    let shell = PageShell::new(&state.site, &menu, state.locale);
    (StatusCode::NOT_FOUND, Html(shell.not_found())).into_response()
}
