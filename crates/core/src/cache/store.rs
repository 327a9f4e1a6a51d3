//! The store contract and the stored response snapshot.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use url::Url;

use super::hash::body_digest;
use super::key::CacheKey;
use crate::Error;
use crate::message::{Body, Response, ResponseType};

/// Immutable snapshot of a response taken at put time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub digest: String,
    pub stored_at: String,
}

impl CachedResponse {
    /// Snapshot a fully read response.
    pub fn new(url: &Url, status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        Self {
            url: url.to_string(),
            status: status.as_u16(),
            headers,
            digest: body_digest(&body),
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a deliverable response. Cached responses are always `Basic`.
    pub fn to_response(&self) -> Response {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                headers.append(name, value);
            }
        }
        Response {
            url: Url::parse(&self.url).ok(),
            status: StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK),
            headers,
            response_type: ResponseType::Basic,
            body: Body::Full(self.body.clone()),
        }
    }
}

/// Bucketed request → response store.
///
/// All operations may suspend. Implementations only guarantee per-key write
/// atomicity.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the bucket if it does not exist yet.
    async fn open(&self, bucket: &str) -> Result<(), Error>;

    /// Look up a key in one bucket.
    async fn match_in(&self, bucket: &str, key: &CacheKey) -> Result<Option<CachedResponse>, Error>;

    /// Look up a key across all buckets, oldest bucket first.
    async fn match_any(&self, key: &CacheKey) -> Result<Option<CachedResponse>, Error>;

    /// Insert or overwrite an entry, creating the bucket if needed.
    async fn put(&self, bucket: &str, key: &CacheKey, response: CachedResponse) -> Result<(), Error>;

    /// Remove a bucket and everything in it. Returns false if it did not exist.
    async fn delete(&self, bucket: &str) -> Result<bool, Error>;

    /// Names of all buckets in creation order.
    async fn bucket_names(&self) -> Result<Vec<String>, Error>;

    /// Keys stored in a bucket; empty when the bucket does not exist.
    async fn keys(&self, bucket: &str) -> Result<Vec<CacheKey>, Error>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
