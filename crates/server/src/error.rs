//! Errors surfaced by the HTTP host.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use herodex_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The incoming request could not be mapped onto the site origin.
    #[error("BAD_REQUEST: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Worker(#[from] Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Worker(Error::Transport(_) | Error::FetchTooLarge(_)) => StatusCode::BAD_GATEWAY,
            ProxyError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
