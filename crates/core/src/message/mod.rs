//! Request and response model shared by the worker, the store and the network.
//!
//! The types deliberately mirror what a fetch handler sees: a method, an
//! absolute URL and headers on the way in; a status, headers, a response type
//! and a (possibly streaming) body on the way out.

mod body;

use bytes::Bytes;
use http::header::{self, HeaderMap};
use http::{Method, StatusCode};
use url::Url;

pub use body::{Body, BodyStream};

use crate::Error;
use crate::cache::CacheKey;

/// Origin classification of a response.
///
/// Only `Basic` (same-origin) responses are ever written to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin response, or one synthesized from the cache.
    Basic,
    /// Cross-origin response with readable body.
    Cors,
    /// Cross-origin response with no readable metadata.
    Opaque,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Cache identity of this request.
    pub fn key(&self) -> CacheKey {
        CacheKey::from_url(&self.url)
    }

    /// A GET request for another path on the same origin.
    ///
    /// Headers are carried over; the query string is dropped.
    pub fn with_path(&self, path: &str) -> Result<Request, Error> {
        let url = self.url.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        Ok(Request { method: Method::GET, url, headers: self.headers.clone(), body: Bytes::new() })
    }
}

/// A response produced by the network, the cache, or the merger.
#[derive(Debug)]
pub struct Response {
    pub url: Option<Url>,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub response_type: ResponseType,
    pub body: Body,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self { url: None, status, headers: HeaderMap::new(), response_type: ResponseType::Basic, body: body.into() }
    }

    /// A same-origin HTML response, used for built-in placeholders.
    pub fn html(status: StatusCode, body: impl Into<Body>) -> Self {
        let mut response = Self::new(status, body);
        response
            .headers
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/html; charset=utf-8"));
        response
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        self.body.collect().await
    }

    /// Read the whole body as (lossy) UTF-8.
    pub async fn text(self) -> Result<String, Error> {
        let bytes = self.body.collect().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Check the cacheable predicate: status 200 from the site's own origin.
    pub fn check_cacheable(&self) -> Result<(), Error> {
        if self.status != StatusCode::OK {
            return Err(Error::InvalidResponse(format!("status {}", self.status.as_u16())));
        }
        if self.response_type != ResponseType::Basic {
            return Err(Error::InvalidResponse(format!("response type {:?}", self.response_type)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_with_path_keeps_origin() {
        let request = Request::get(url("https://herodex.test/heroes/thor.html?ref=nav"));
        let fragment = request.with_path("/heroes/thor-content.part.html").unwrap();
        assert_eq!(fragment.url.as_str(), "https://herodex.test/heroes/thor-content.part.html");
        assert_eq!(fragment.method, Method::GET);
    }

    #[test]
    fn test_cacheable_predicate() {
        let ok = Response::new(StatusCode::OK, "x");
        assert!(ok.check_cacheable().is_ok());

        let not_found = Response::new(StatusCode::NOT_FOUND, "x");
        assert!(matches!(not_found.check_cacheable(), Err(Error::InvalidResponse(_))));

        let mut cors = Response::new(StatusCode::OK, "x");
        cors.response_type = ResponseType::Cors;
        assert!(matches!(cors.check_cacheable(), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn test_html_sets_content_type() {
        let response = Response::html(StatusCode::SERVICE_UNAVAILABLE, "<p>offline</p>");
        assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
    }
}
