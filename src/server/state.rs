use crate::api::ApiClient;
use crate::config::{Config, SiteInfo};
use crate::render::DisplayLocale;
use anyhow::{Context, Result};

/// Shared, read-only state of the HTTP server.
///
/// Nothing fetched from the provider is kept here: each request fetches
/// and owns its own data.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: ApiClient,
    pub site: SiteInfo,
    pub locale: DisplayLocale,
}

impl AppState {
    pub fn new(client: ApiClient, site: SiteInfo, locale: DisplayLocale) -> Self {
        Self {
            client,
            site,
            locale,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let offset = config.utc_offset()?;
        let client = ApiClient::new(&config.api_base_url, config.request_timeout())
            .with_context(|| format!("Failed to create provider client for {}", config.api_base_url))?
            .with_local_offset(offset);
        Ok(Self::new(client, config.site(), DisplayLocale::new(offset)))
    }
}
