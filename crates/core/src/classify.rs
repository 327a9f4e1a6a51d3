//! Request classification: which strategy serves a path, and which bucket
//! receives what it fetches.

use crate::cache::BucketRole;
use crate::manifest::AssetManifest;

/// Suffix of the dynamic content fragment served inside the shell.
pub const CONTENT_FRAGMENT_SUFFIX: &str = "-content.part.html";

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

/// How a request is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Served from the app bucket only.
    CacheOnly,
    /// Cache hit short-circuits; network on miss.
    CacheFirst,
    /// Network first; cache, then an offline placeholder, on transport failure.
    NetworkFirst,
    /// Full page: shell top + content fragment + shell bottom.
    Shell,
    /// Not handled; goes straight to the network.
    PassThrough,
}

/// Result of classifying a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub strategy: StrategyKind,
    pub bucket: Option<BucketRole>,
}

impl Classification {
    const fn new(strategy: StrategyKind, bucket: Option<BucketRole>) -> Self {
        Self { strategy, bucket }
    }
}

/// Maps request paths to a [`Classification`].
#[derive(Debug, Clone)]
pub struct Classifier {
    manifest: AssetManifest,
}

impl Classifier {
    pub fn new(manifest: AssetManifest) -> Self {
        Self { manifest }
    }

    /// Classify a URL path (no query string).
    ///
    /// First match wins: manifest entry, image, content fragment, JSON data,
    /// HTML page or site root.
    pub fn classify(&self, path: &str) -> Classification {
        if self.manifest.contains(path) {
            return Classification::new(StrategyKind::CacheOnly, Some(BucketRole::App));
        }
        if is_image(path) {
            return Classification::new(StrategyKind::CacheFirst, Some(BucketRole::Image));
        }
        if is_content_fragment(path) || path.ends_with(".json") {
            return Classification::new(StrategyKind::NetworkFirst, Some(BucketRole::Article));
        }
        if path.ends_with(".html") || path == "/" {
            return Classification::new(StrategyKind::Shell, Some(BucketRole::App));
        }
        Classification::new(StrategyKind::PassThrough, None)
    }
}

pub fn is_image(path: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn is_content_fragment(path: &str) -> bool {
    path.ends_with(CONTENT_FRAGMENT_SUFFIX)
}

/// Content fragment that fills the shell for a full-page path.
///
/// `x.html` maps to `x-content.part.html`, the root maps to `default_fragment`.
/// Returns `None` for anything that is not a page. Only the trailing `.html`
/// is rewritten: `/a.html.html` maps to `/a.html-content.part.html`.
pub fn fragment_path(path: &str, default_fragment: &str) -> Option<String> {
    if path == "/" {
        return Some(default_fragment.to_string());
    }
    path.strip_suffix(".html")
        .map(|stem| format!("{stem}{CONTENT_FRAGMENT_SUFFIX}"))
}
