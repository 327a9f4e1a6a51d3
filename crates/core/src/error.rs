//! Unified error types for herodex.
//!
//! Every variant carries a stable code prefix so log lines and host error pages
//! can be matched on without parsing the free-form message.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the network client and the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The network could not be reached (DNS, connect, timeout, reset).
    ///
    /// This is the only failure that triggers the network-to-cache fallback.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Cache miss with no fallback left.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Response is not eligible for caching (non-200 or cross-origin).
    ///
    /// Never surfaces to the client; the response itself is still delivered.
    #[error("INVALID_RESPONSE: {0}")]
    InvalidResponse(String),

    /// A manifest asset could not be precached.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailure(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Invalid URL or site path.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A merged response could not be assembled.
    #[error("MERGE_FAILED: {0}")]
    Merge(String),

    /// The consumer went away before the response was complete.
    #[error("CANCELLED: {0}")]
    Cancelled(String),
}

impl Error {
    /// True for network-level failures, the trigger for cache fallback.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True when a cache lookup came up empty.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}
