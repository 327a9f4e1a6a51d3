//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HERODEX_*)
//! 2. TOML config file (if HERODEX_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::BucketNames;
use crate::manifest::{AssetManifest, DEFAULT_ASSETS};

mod validation;

pub use validation::ConfigError;

/// Which [`CacheStore`](crate::cache::CacheStore) backend the host opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

/// Well-known site paths the worker relies on besides the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub shell_top: String,
    pub shell_bottom: String,
    pub offline_page: String,
    pub offline_content: String,
    pub default_fragment: String,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HERODEX_*)
/// 2. TOML config file (if HERODEX_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the site being proxied, e.g. `https://herodex.example`.
    ///
    /// Responses from any other origin are never cached.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Address the proxy listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Cache backend.
    #[serde(default = "default_store")]
    pub store: StoreBackend,

    /// Path to SQLite cache database (sqlite backend only).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Deployment version, appended to the app bucket name.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Logical name of the versioned app bucket.
    #[serde(default = "default_app_cache_role")]
    pub app_cache_role: String,

    /// Bucket for content fragments and JSON data.
    #[serde(default = "default_article_cache")]
    pub article_cache: String,

    /// Bucket for images.
    #[serde(default = "default_image_cache")]
    pub image_cache: String,

    /// Assets precached at install.
    #[serde(default)]
    pub manifest: AssetManifest,

    #[serde(default = "default_shell_top")]
    pub shell_top: String,

    #[serde(default = "default_shell_bottom")]
    pub shell_bottom: String,

    /// Page served when a request cannot be answered at all.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Fragment served in place of content that is neither reachable nor cached.
    #[serde(default = "default_offline_content")]
    pub offline_content: String,

    /// Fragment shown for the site root.
    #[serde(default = "default_fragment")]
    pub default_fragment: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".into()
}

fn default_store() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./herodex-cache.sqlite")
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_app_cache_role() -> String {
    "herodex-app-cache".into()
}

fn default_article_cache() -> String {
    "herodex-article-cache".into()
}

fn default_image_cache() -> String {
    "herodex-image-cache".into()
}

fn default_shell_top() -> String {
    "/site-shell-top.part.html".into()
}

fn default_shell_bottom() -> String {
    "/site-shell-bottom.part.html".into()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_offline_content() -> String {
    "/offline-content.part.html".into()
}

fn default_fragment() -> String {
    "/index-content.part.html".into()
}

fn default_user_agent() -> String {
    "herodex/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            listen_addr: default_listen_addr(),
            store: default_store(),
            db_path: default_db_path(),
            cache_version: default_cache_version(),
            app_cache_role: default_app_cache_role(),
            article_cache: default_article_cache(),
            image_cache: default_image_cache(),
            manifest: AssetManifest::new(DEFAULT_ASSETS.iter().copied()),
            shell_top: default_shell_top(),
            shell_bottom: default_shell_bottom(),
            offline_page: default_offline_page(),
            offline_content: default_offline_content(),
            default_fragment: default_fragment(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed site origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }

    pub fn buckets(&self) -> BucketNames {
        BucketNames::new(&self.app_cache_role, &self.cache_version, &self.article_cache, &self.image_cache)
    }

    pub fn site_paths(&self) -> SitePaths {
        SitePaths {
            shell_top: self.shell_top.clone(),
            shell_bottom: self.shell_bottom.clone(),
            offline_page: self.offline_page.clone(),
            offline_content: self.offline_content.clone(),
            default_fragment: self.default_fragment.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HERODEX_`
    /// 2. TOML file from `HERODEX_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HERODEX_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HERODEX_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
