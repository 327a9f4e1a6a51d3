//! Network access for the worker.
//!
//! ### Contract
//! - Any HTTP status is a successful fetch; only transport failures
//!   (DNS, connect, TLS, timeout, reset) are errors.
//! - Responses whose final URL is on the site origin are `Basic`, everything
//!   else is `Cors`.
//! - Bodies are streamed, never buffered, and capped at `max_bytes`.
//! - Hop-by-hop headers are stripped in both directions.

pub mod url;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{self, HeaderMap};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize_origin, is_same_origin, site_url};

use herodex_core::{AppConfig, Body, Error, Request, Response, ResponseType};

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Capability to fetch a request from the network.
///
/// The worker only ever talks to the network through this trait, so tests can
/// substitute a scripted implementation.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Site origin; decides `Basic` vs `Cors`.
    pub origin: ::url::Url,

    /// User agent string (default: "herodex/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            origin: ::url::Url::parse("http://127.0.0.1:8080/").expect("static origin parses"),
            user_agent: "herodex/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Derive the fetch settings from the application config.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = canonicalize_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        })
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let mut headers = request.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        let mut outgoing = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(headers);
        if !request.body.is_empty() {
            outgoing = outgoing.body(request.body.clone());
        }

        let response = outgoing
            .send()
            .await
            .map_err(|e| Error::Transport(format!("network error: {}", e)))?;

        let status = response.status();
        let max_bytes = self.config.max_bytes;

        if let Some(len) = response.content_length()
            && len as usize > max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, max_bytes)));
        }

        let final_url = response.url().clone();
        let response_type =
            if is_same_origin(&final_url, &self.config.origin) { ResponseType::Basic } else { ResponseType::Cors };

        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        tracing::debug!(
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            response_type = ?response_type,
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched response head"
        );

        let mut seen = 0usize;
        let body = response.bytes_stream().map(move |chunk| {
            let chunk = chunk.map_err(|e| Error::Transport(format!("failed to read response: {}", e)))?;
            seen += chunk.len();
            if seen > max_bytes {
                return Err(Error::FetchTooLarge(format!("body exceeds {} bytes", max_bytes)));
            }
            Ok(chunk)
        });

        Ok(Response { url: Some(final_url), status, headers, response_type, body: Body::from_stream(body) })
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}
