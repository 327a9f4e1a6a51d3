//! Request identity used as the cache key.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Absolute request URL with the fragment removed.
///
/// Two requests share an entry only when their keys are byte-identical, so
/// `?a=1&b=2` and `?b=2&a=1` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(url.into())
    }

    /// Key for a site path resolved against an origin.
    pub fn for_path(origin: &Url, path: &str) -> Result<Self, url::ParseError> {
        origin.join(path).map(|url| Self::from_url(&url))
    }

    pub(crate) fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
