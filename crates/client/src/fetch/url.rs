//! URL helpers for resolving site paths against the proxied origin.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("not a site path: {0}")]
    NotSitePath(String),
}

/// Canonicalize an origin string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Drop path, query and fragment
pub fn canonicalize_origin(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a site path (with optional query) against the origin.
///
/// Only absolute paths are accepted; a protocol-relative `//host/...` would
/// otherwise escape the origin.
pub fn site_url(origin: &Url, path_and_query: &str) -> Result<Url, UrlError> {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return Err(UrlError::NotSitePath(path_and_query.to_string()));
    }
    let mut url = origin
        .join(path_and_query)
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    url.set_fragment(None);
    Ok(url)
}

/// Whether two URLs share scheme, host and port.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize_origin("https://herodex.test").unwrap();
        assert_eq!(url.as_str(), "https://herodex.test/");
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize_origin("herodex.test").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("herodex.test"));
    }

    #[test]
    fn test_canonicalize_lowercase_host_and_drop_path() {
        let url = canonicalize_origin("  http://HERODEX.test:8080/heroes/thor.html?x=1#top ").unwrap();
        assert_eq!(url.as_str(), "http://herodex.test:8080/");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize_origin("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize_origin("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_site_url_keeps_query() {
        let origin = canonicalize_origin("https://herodex.test").unwrap();
        let url = site_url(&origin, "/data/heroes.json?page=2").unwrap();
        assert_eq!(url.as_str(), "https://herodex.test/data/heroes.json?page=2");
    }

    #[test]
    fn test_site_url_rejects_escapes() {
        let origin = canonicalize_origin("https://herodex.test").unwrap();
        assert!(matches!(site_url(&origin, "//evil.test/x"), Err(UrlError::NotSitePath(_))));
        assert!(matches!(site_url(&origin, "https://evil.test/x"), Err(UrlError::NotSitePath(_))));
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("https://herodex.test/a").unwrap();
        let b = Url::parse("https://herodex.test/b?c").unwrap();
        let c = Url::parse("http://herodex.test/a").unwrap();
        assert!(is_same_origin(&a, &b));
        assert!(!is_same_origin(&a, &c));
    }
}
