//! axum glue: every request goes through the worker's intercept hook.

use std::sync::Arc;

use axum::Router;
use axum::body::Body as AxumBody;
use axum::extract::{Request as AxumRequest, State};
use axum::response::Response as AxumResponse;

use herodex_client::{Network, site_url};
use herodex_core::{Body, Request, Response};

use crate::error::ProxyError;
use crate::worker::{Intercept, Worker};

#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<Worker>,
    /// Serves requests the worker declines.
    pub network: Arc<dyn Network>,
    /// Largest request body accepted from clients.
    pub max_body: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new().fallback(proxy).with_state(state)
}

async fn proxy(State(state): State<AppState>, request: AxumRequest) -> Result<AxumResponse, ProxyError> {
    let request = into_request(&state, request).await?;

    let response = match state.worker.intercept(request.clone()).await? {
        Intercept::Respond(response) => response,
        Intercept::Decline => {
            tracing::debug!(method = %request.method, url = %request.url, "passing through");
            state.network.fetch(&request).await?
        }
    };

    Ok(into_axum(response))
}

async fn into_request(state: &AppState, request: AxumRequest) -> Result<Request, ProxyError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let url = site_url(state.worker.origin(), path_and_query).map_err(|e| ProxyError::BadRequest(e.to_string()))?;
    let body = axum::body::to_bytes(body, state.max_body)
        .await
        .map_err(|e| ProxyError::BadRequest(format!("failed to read request body: {e}")))?;

    Ok(Request { method: parts.method, url, headers: parts.headers, body })
}

fn into_axum(response: Response) -> AxumResponse {
    let body = match response.body {
        Body::Full(bytes) => AxumBody::from(bytes),
        Body::Stream(stream) => AxumBody::from_stream(stream),
    };
    let mut out = AxumResponse::new(body);
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    out
}
