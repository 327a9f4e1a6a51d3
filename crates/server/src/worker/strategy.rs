//! Fetch strategies.
//!
//! Every strategy answers through [`Fetcher::resolve`]. Network responses that
//! qualify for caching are teed: the caller gets the stream, and a background
//! task writes the copy once the caller has read it to the end.

use std::sync::Arc;

use http::StatusCode;
use tokio_util::task::TaskTracker;

use herodex_client::Network;
use herodex_core::classify::{Classification, StrategyKind, is_content_fragment};
use herodex_core::{BucketNames, BucketRole, CacheKey, CacheStore, CachedResponse, Error, Request, Response};

/// Body served by network-first when the network is down and neither the
/// request nor the cached offline fragment is available.
pub const OFFLINE_CONTENT: &str =
    "<div class=\"offline\"><h2>You are offline</h2><p>This page is not available offline yet.</p></div>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Reads the named bucket only; for the app role that is the current
    /// version, never a stale one awaiting activation.
    CacheOnly(BucketRole),
    CacheFirst,
    NetworkFirst,
}

impl Strategy {
    /// Strategy for a classification, if it resolves through the fetcher.
    pub fn from_classification(classification: Classification) -> Option<Self> {
        match classification.strategy {
            StrategyKind::CacheOnly => {
                Some(Strategy::CacheOnly(classification.bucket.unwrap_or(BucketRole::App)))
            }
            StrategyKind::CacheFirst => Some(Strategy::CacheFirst),
            StrategyKind::NetworkFirst => Some(Strategy::NetworkFirst),
            StrategyKind::Shell | StrategyKind::PassThrough => None,
        }
    }
}

/// Bucket a network response is written to, if any.
///
/// Image content goes to the image bucket; content fragments and JSON go to
/// the article bucket.
pub fn target_bucket(path: &str, content_type: Option<&str>) -> Option<BucketRole> {
    let content_type = content_type.unwrap_or_default();
    if content_type.contains("image") {
        Some(BucketRole::Image)
    } else if is_content_fragment(path) || content_type.contains("json") {
        Some(BucketRole::Article)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct Fetcher {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    buckets: BucketNames,
    offline_content: String,
    tasks: TaskTracker,
}

impl Fetcher {
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn Network>, buckets: BucketNames, offline_content: String,
        tasks: TaskTracker,
    ) -> Self {
        Self { store, network, buckets, offline_content, tasks }
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub async fn resolve(&self, strategy: Strategy, request: &Request) -> Result<Response, Error> {
        match strategy {
            Strategy::CacheOnly(role) => self.cache_only(role, request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        }
    }

    async fn cache_only(&self, role: BucketRole, request: &Request) -> Result<Response, Error> {
        let key = request.key();
        let bucket = self.buckets.name_for(role);
        match self.store.match_in(&bucket, &key).await? {
            Some(hit) => {
                tracing::debug!(bucket = %bucket, key = %key, "cache hit");
                Ok(hit.to_response())
            }
            None => Err(Error::NotFound(key.to_string())),
        }
    }

    async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        let key = request.key();
        if let Some(hit) = self.lookup(&key).await {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit.to_response());
        }

        tracing::debug!(key = %key, "cache miss, fetching");
        let response = self.network.fetch(request).await?;
        Ok(self.store_copy(request, response))
    }

    async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        match self.network.fetch(request).await {
            Ok(response) => Ok(self.store_copy(request, response)),
            Err(e) if e.is_transport() => {
                tracing::warn!(url = %request.url, error = %e, "network unreachable, falling back to cache");
                self.offline_fallback(request).await
            }
            Err(e) => Err(e),
        }
    }

    async fn offline_fallback(&self, request: &Request) -> Result<Response, Error> {
        if let Some(hit) = self.lookup(&request.key()).await {
            return Ok(hit.to_response());
        }

        let placeholder = request.with_path(&self.offline_content)?.key();
        if let Some(hit) = self.match_app(&placeholder).await {
            tracing::debug!(url = %request.url, "serving cached offline content");
            return Ok(hit.to_response());
        }

        tracing::debug!(url = %request.url, "serving built-in offline content");
        Ok(Response::html(StatusCode::OK, OFFLINE_CONTENT))
    }

    /// Look a key up in the current app bucket. Store errors count as a miss.
    pub async fn match_app(&self, key: &CacheKey) -> Option<CachedResponse> {
        let bucket = self.buckets.current_app();
        match self.store.match_in(&bucket, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(bucket = %bucket, key = %key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store errors count as a miss so the strategy can still answer.
    async fn lookup(&self, key: &CacheKey) -> Option<CachedResponse> {
        match self.store.match_any(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    fn store_copy(&self, request: &Request, response: Response) -> Response {
        let Some(role) = target_bucket(request.path(), response.content_type()) else {
            return response;
        };
        if let Err(e) = response.check_cacheable() {
            tracing::debug!(url = %request.url, error = %e, "response not cached");
            return response;
        }

        let Response { url, status, headers, response_type, body } = response;
        let (body, copy) = body.tee();

        let store = Arc::clone(&self.store);
        let bucket = self.buckets.name_for(role);
        let key = request.key();
        let stored_url = url.clone().unwrap_or_else(|| request.url.clone());
        let stored_headers = headers.clone();

        self.tasks.spawn(async move {
            let Ok(bytes) = copy.await else {
                tracing::debug!(key = %key, "body not read to the end, cache write abandoned");
                return;
            };
            let cached = CachedResponse::new(&stored_url, status, &stored_headers, bytes);
            match store.put(&bucket, &key, cached).await {
                Ok(()) => tracing::debug!(bucket = %bucket, key = %key, "cached response"),
                Err(e) => tracing::warn!(bucket = %bucket, key = %key, error = %e, "background cache write failed"),
            }
        });

        Response { url, status, headers, response_type, body }
    }
}
