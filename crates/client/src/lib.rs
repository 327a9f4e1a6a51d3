//! Client code for herodex.
//!
//! This crate provides the network side of the worker: the [`Network`]
//! capability, its reqwest implementation, and helpers for resolving site
//! paths against the proxied origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize_origin, is_same_origin, site_url};
