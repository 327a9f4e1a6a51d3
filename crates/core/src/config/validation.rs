//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `cache_version` is empty
    /// - bucket names collide
    /// - a site path does not start with `/`
    ///
    /// Returns `ConfigError::Missing` if a shell or offline path is not in the
    /// manifest, since those are served cache-only.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }

        let current_app = self.buckets().current_app();
        if self.article_cache == self.image_cache
            || self.article_cache == current_app
            || self.image_cache == current_app
        {
            return Err(ConfigError::Invalid {
                field: "article_cache".into(),
                reason: "app, article and image buckets must have distinct names".into(),
            });
        }
        for (field, name) in [("article_cache", &self.article_cache), ("image_cache", &self.image_cache)] {
            if name.starts_with(&format!("{}-", self.app_cache_role)) {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not start with the app cache role, or activation would delete it".into(),
                });
            }
        }

        let paths = [
            ("shell_top", &self.shell_top),
            ("shell_bottom", &self.shell_bottom),
            ("offline_page", &self.offline_page),
            ("offline_content", &self.offline_content),
            ("default_fragment", &self.default_fragment),
        ];
        for (field, path) in paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must start with '/'".into() });
            }
        }
        if let Some(bad) = self.manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid { field: "manifest".into(), reason: format!("{bad} must start with '/'") });
        }

        for (field, path) in &paths[..4] {
            if !self.manifest.contains(path) {
                return Err(ConfigError::Missing {
                    field: (*field).into(),
                    hint: format!("add {path} to the manifest so it is precached"),
                });
            }
        }

        if self.manifest.is_empty() {
            tracing::warn!("manifest is empty; install will precache nothing");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AssetManifest;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_bucket_collision() {
        let config = AppConfig { image_cache: "herodex-article-cache".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validate_bucket_shadowed_by_app_role() {
        let config = AppConfig { image_cache: "herodex-app-cache-images".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "image_cache"));
    }

    #[test]
    fn test_validate_relative_path() {
        let config = AppConfig { default_fragment: "index-content.part.html".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "default_fragment"));
    }

    #[test]
    fn test_validate_shell_missing_from_manifest() {
        let config = AppConfig { manifest: AssetManifest::new(["/css/main.css"]), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "shell_top"));
    }
}
