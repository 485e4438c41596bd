//! HTTP front end (axum).
//!
//! Every page is rendered per request from fresh provider data; the server
//! keeps no cache.

use crate::config::Config;
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/articles/all", get(handlers::all_articles))
        .route("/articles/otani", get(handlers::topic_articles))
        .route("/articles/rss", get(handlers::rss_feed))
        .route("/articles/source/:id", get(handlers::source_articles))
        .route("/articles/:id", get(handlers::article_detail))
        .route("/rss.xml", get(handlers::rss_feed))
        .route("/sitemap.xml", get(handlers::sitemap))
        .route("/about", get(handlers::about))
        .route("/privacy", get(handlers::privacy))
        .route("/disclaimer", get(handlers::disclaimer))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `config.bind` and serve until Ctrl+C.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    tracing::info!(
        bind = %config.bind,
        api_base_url = %config.api_base_url,
        "Serving site"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Never resolve: without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
