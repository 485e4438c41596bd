//! Configuration file parser for `matome.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
//!
//! Precedence for the provider base URL: CLI flag, then the
//! `MATOME_API_BASE_URL` environment variable, then the file, then the default.
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable that overrides `api_base_url` from the config file.
pub const API_BASE_URL_ENV: &str = "MATOME_API_BASE_URL";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// `api_base_url` or `site_url` is not an absolute http(s) URL.
    #[error("Invalid base URL '{0}': expected an absolute http(s) URL")]
    InvalidBaseUrl(String),

    /// `utc_offset_minutes` is outside ±24h.
    #[error("Invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the article provider, including the `/api` prefix.
    pub api_base_url: String,

    /// Public URL of this site; used for feed links, JSON-LD and the sitemap.
    pub site_url: String,

    /// Site name shown in the header and used as the feed/JSON-LD name.
    pub site_name: String,

    /// One-line site description.
    pub site_description: String,

    /// Human-readable name of the topic-filtered listing.
    pub topic_name: String,

    /// Content language (RSS `<language>`, `<html lang>`).
    pub language: String,

    /// Optional logo for the JSON-LD publisher.
    pub logo_url: Option<String>,

    /// Operator shown on the about page.
    pub operator: Option<String>,

    /// Contact address shown on the about page.
    pub contact: Option<String>,

    /// Site search URL with a `{search_term_string}` placeholder. When set,
    /// the WebSite JSON-LD advertises a SearchAction.
    pub search_url_template: Option<String>,

    /// Address the HTTP server binds to.
    pub bind: String,

    /// Per-request timeout against the provider, in seconds.
    pub request_timeout_secs: u64,

    /// Offset applied to timestamps when rendering them for readers.
    pub utc_offset_minutes: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            site_url: "http://localhost:3000".to_string(),
            site_name: "Shohei Ohtani News".to_string(),
            site_description: "大谷翔平に関するニュース・成績・移籍情報をまとめたポータルサイト。"
                .to_string(),
            topic_name: "大谷翔平".to_string(),
            language: "ja".to_string(),
            logo_url: None,
            operator: None,
            contact: None,
            search_url_template: None,
            bind: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
            utc_offset_minutes: 9 * 60,
        }
    }
}

/// Site-wide identity used by the renderers and projectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteInfo {
    pub name: String,
    /// Site root, always without a trailing slash.
    pub url: String,
    pub description: String,
    pub topic_name: String,
    pub language: String,
    pub logo_url: Option<String>,
    pub operator: Option<String>,
    pub contact: Option<String>,
    pub search_url_template: Option<String>,
}

impl SiteInfo {
    /// Absolute URL for a site-relative path (`"/articles/all"`).
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.url, path)
        } else {
            format!("{}/{}", self.url, path)
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 13] = [
        "api_base_url",
        "site_url",
        "site_name",
        "site_description",
        "topic_name",
        "language",
        "logo_url",
        "operator",
        "contact",
        "search_url_template",
        "bind",
        "request_timeout_secs",
        "utc_offset_minutes",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; see [`Config::load`].
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::info!(api_base_url = %config.api_base_url, bind = %config.bind, "Loaded configuration");
        Ok(config)
    }

    /// Apply the environment override for the provider base URL.
    pub fn apply_env(&mut self) {
        if let Ok(base) = std::env::var(API_BASE_URL_ENV) {
            if !base.trim().is_empty() {
                tracing::info!(api_base_url = %base, "Using provider base URL from environment");
                self.api_base_url = base;
            }
        }
    }

    /// Check the fields that later stages would otherwise fail on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for raw in [&self.api_base_url, &self.site_url] {
            let ok = Url::parse(raw)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
                .unwrap_or(false);
            if !ok {
                return Err(ConfigError::InvalidBaseUrl(raw.clone()));
            }
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    pub fn site(&self) -> SiteInfo {
        SiteInfo {
            name: self.site_name.clone(),
            url: self.site_url.trim_end_matches('/').to_string(),
            description: self.site_description.clone(),
            topic_name: self.topic_name.clone(),
            language: self.language.clone(),
            logo_url: self.logo_url.clone(),
            operator: self.operator.clone(),
            contact: self.contact.clone(),
            search_url_template: self.search_url_template.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
