//! The list of assets precached at install.

use serde::{Deserialize, Serialize};

/// Assets shipped with every deployment.
pub const DEFAULT_ASSETS: &[&str] = &[
    "/css/main.css",
    "/js/main.js",
    "/site-shell-top.part.html",
    "/site-shell-bottom.part.html",
    "/404.html",
    "/offline.html",
    "/offline-content.part.html",
    "/images/icons/icon-192x192.png",
    "/images/icons/icon-512x512.png",
];

/// Ordered list of site paths that must be in the app bucket after install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    paths: Vec<String>,
}

impl AssetManifest {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }

    /// Exact path match; no normalization is applied.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = AssetManifest::default();
        assert_eq!(manifest.len(), DEFAULT_ASSETS.len());
        assert!(manifest.contains("/css/main.css"));
        assert!(manifest.contains("/offline-content.part.html"));
    }

    #[test]
    fn test_contains_is_exact() {
        let manifest = AssetManifest::new(["/css/main.css"]);
        assert!(!manifest.contains("/css/main.css?v=2"));
        assert!(!manifest.contains("/CSS/main.css"));
    }

    #[test]
    fn test_preserves_order() {
        let manifest = AssetManifest::new(["/b.css", "/a.css"]);
        assert_eq!(manifest.iter().collect::<Vec<_>>(), vec!["/b.css", "/a.css"]);
    }
}
