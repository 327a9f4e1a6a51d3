//! The caching worker.
//!
//! [`Worker`] owns the three hooks the host drives: `install` before serving,
//! `activate` once installed, and `intercept` for every request. Requests move
//! through Classified → Resolving → Responded; each step is traced.

pub mod lifecycle;
pub mod merge;
pub mod navigate;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use futures::FutureExt;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use tokio_util::task::TaskTracker;
use url::Url;

use herodex_client::{Network, canonicalize_origin};
use herodex_core::classify::fragment_path;
use herodex_core::{AppConfig, BucketRole, CacheStore, Classifier, Error, Request, Response, SitePaths, StrategyKind};

pub use lifecycle::{ActivateReport, InstallReport, Lifecycle};
pub use merge::{Merged, Part, merge};
pub use navigate::{Navigation, NavigationIntent, NavigationMode};
pub use strategy::{Fetcher, OFFLINE_CONTENT, Strategy};

/// Page served when a request can be answered neither from the network nor
/// the cache, and `/offline.html` is not cached either.
pub const OFFLINE_PAGE: &str = "<!doctype html><html><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>You are offline</h1><p>This page is not available offline.</p></body></html>";

/// What the worker does with an intercepted request.
#[derive(Debug)]
pub enum Intercept {
    Respond(Response),
    /// Not handled; the host fetches it from the network without caching.
    Decline,
}

pub struct Worker {
    origin: Url,
    classifier: Classifier,
    paths: SitePaths,
    fetcher: Fetcher,
    lifecycle: Lifecycle,
    tasks: TaskTracker,
}

impl Worker {
    pub fn new(config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = canonicalize_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let buckets = config.buckets();
        let tasks = TaskTracker::new();

        let fetcher = Fetcher::new(
            Arc::clone(&store),
            Arc::clone(&network),
            buckets.clone(),
            config.offline_content.clone(),
            tasks.clone(),
        );
        let lifecycle = Lifecycle::new(store, network, buckets, config.manifest.clone(), origin.clone());

        Ok(Self {
            origin,
            classifier: Classifier::new(config.manifest.clone()),
            paths: config.site_paths(),
            fetcher,
            lifecycle,
            tasks,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.activate().await
    }

    /// Answer a request from the cache, the network or both.
    ///
    /// `NotFound` never escapes: it becomes the offline page. Transport errors
    /// from cache-first do, and the host reports them as a bad gateway.
    pub async fn intercept(&self, request: Request) -> Result<Intercept, Error> {
        if request.method != Method::GET {
            tracing::debug!(method = %request.method, url = %request.url, "declined");
            return Ok(Intercept::Decline);
        }

        let classification = self.classifier.classify(request.path());
        tracing::debug!(url = %request.url, strategy = ?classification.strategy, "classified");

        let resolved = match classification.strategy {
            StrategyKind::PassThrough => {
                tracing::debug!(url = %request.url, "declined");
                return Ok(Intercept::Decline);
            }
            StrategyKind::Shell => self.shell(&request).await,
            _ => match Strategy::from_classification(classification) {
                Some(strategy) => self.fetcher.resolve(strategy, &request).await,
                None => return Ok(Intercept::Decline),
            },
        };

        match resolved {
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status.as_u16(), "responded");
                Ok(Intercept::Respond(response))
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(url = %request.url, error = %e, "serving offline page");
                Ok(Intercept::Respond(self.offline_page(&request).await))
            }
            Err(e) => Err(e),
        }
    }

    /// Cached shell top, fresh content, cached shell bottom, as one stream.
    async fn shell(&self, request: &Request) -> Result<Response, Error> {
        let fragment = fragment_path(request.path(), &self.paths.default_fragment)
            .ok_or_else(|| Error::NotFound(format!("no content fragment for {}", request.path())))?;

        let parts = vec![
            self.part(Strategy::CacheOnly(BucketRole::App), request.with_path(&self.paths.shell_top)?),
            self.part(Strategy::NetworkFirst, request.with_path(&fragment)?),
            self.part(Strategy::CacheOnly(BucketRole::App), request.with_path(&self.paths.shell_bottom)?),
        ];

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));

        let Merged { mut response, completion } = merge(parts, Some(headers)).await?;
        response.url = Some(request.url.clone());

        let url = request.url.clone();
        self.tasks.spawn(async move {
            match completion.await {
                Ok(()) => tracing::debug!(url = %url, "merged response complete"),
                Err(e) => tracing::warn!(url = %url, error = %e, "merged response incomplete"),
            }
        });

        Ok(response)
    }

    fn part(&self, strategy: Strategy, request: Request) -> Part {
        let fetcher = self.fetcher.clone();
        async move { fetcher.resolve(strategy, &request).await }.boxed()
    }

    async fn offline_page(&self, request: &Request) -> Response {
        let cached = match request.with_path(&self.paths.offline_page) {
            Ok(page) => self.fetcher.match_app(&page.key()).await,
            Err(_) => None,
        };

        let mut response = match cached {
            Some(hit) => hit.to_response(),
            None => Response::html(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_PAGE),
        };
        response.status = StatusCode::SERVICE_UNAVAILABLE;
        response
    }

    /// Wait for all background work (cache writes, merge completions) to
    /// finish.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}
