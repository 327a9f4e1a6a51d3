//! HTTP host for the herodex caching worker.
//!
//! The [`worker`] module holds the caching proxy itself; [`handler`] exposes
//! it as an axum fallback route in front of the site origin.

pub mod error;
pub mod handler;
pub mod worker;

pub use error::ProxyError;
pub use handler::{AppState, router};
pub use worker::{Intercept, Worker};
