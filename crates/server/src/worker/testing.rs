//! Scripted network and fixtures shared by the worker and handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use http::header::{self, HeaderValue};
use http::StatusCode;

use herodex_client::Network;
use herodex_core::{AppConfig, Body, Error, MemoryStore, Request, Response, ResponseType};

use super::Worker;

pub(crate) const ORIGIN: &str = "https://herodex.test";

#[derive(Debug, Clone)]
pub(crate) struct Route {
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
    delay: Duration,
    response_type: ResponseType,
}

impl Route {
    pub(crate) fn ok(content_type: &'static str, body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type,
            body: Bytes::from_static(body.as_bytes()),
            delay: Duration::ZERO,
            response_type: ResponseType::Basic,
        }
    }

    pub(crate) fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn cross_origin(mut self) -> Self {
        self.response_type = ResponseType::Cors;
        self
    }
}

/// In-process [`Network`] with canned routes, per-route latency and an
/// offline switch. Unknown paths answer 404.
#[derive(Debug, Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Route>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stub serving every default manifest asset.
    pub(crate) fn site() -> Self {
        let network = Self::new();
        network.route("/css/main.css", Route::ok("text/css", "body{margin:0}"));
        network.route("/js/main.js", Route::ok("application/javascript", "console.log('herodex')"));
        network.route("/site-shell-top.part.html", Route::ok("text/html", "<html><body><main>"));
        network.route("/site-shell-bottom.part.html", Route::ok("text/html", "</main></body></html>"));
        network.route("/404.html", Route::ok("text/html", "<h1>Not found</h1>"));
        network.route("/offline.html", Route::ok("text/html", "<h1>You are offline</h1>"));
        network.route("/offline-content.part.html", Route::ok("text/html", "<p>cached offline notice</p>"));
        network.route("/images/icons/icon-192x192.png", Route::ok("image/png", "png-192"));
        network.route("/images/icons/icon-512x512.png", Route::ok("image/png", "png-512"));
        network
    }

    pub(crate) fn route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let path = request.path().to_string();
        self.calls.lock().unwrap().push(path.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Transport(format!("{path}: network unreachable")));
        }

        let route = self.routes.lock().unwrap().get(&path).cloned();
        let Some(route) = route else {
            let mut response = Response::new(StatusCode::NOT_FOUND, "not found");
            response.url = Some(request.url.clone());
            return Ok(response);
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        // Two chunks, so consumers see a real stream.
        let split = route.body.len() / 2;
        let chunks = vec![Ok(route.body.slice(..split)), Ok(route.body.slice(split..))];

        let mut response = Response::new(route.status, Body::from_stream(stream::iter(chunks)));
        response.url = Some(request.url.clone());
        response.response_type = route.response_type;
        response
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(route.content_type));
        Ok(response)
    }
}

pub(crate) fn config() -> AppConfig {
    AppConfig { origin: ORIGIN.into(), store: herodex_core::StoreBackend::Memory, ..Default::default() }
}

pub(crate) fn worker_with(config: &AppConfig, network: Arc<StubNetwork>) -> (Worker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let worker = Worker::new(config, store.clone(), network).unwrap();
    (worker, store)
}

pub(crate) fn worker(network: Arc<StubNetwork>) -> (Worker, Arc<MemoryStore>) {
    worker_with(&config(), network)
}

pub(crate) fn request(path: &str) -> Request {
    Request::get(herodex_client::site_url(&url::Url::parse(ORIGIN).unwrap(), path).unwrap())
}
