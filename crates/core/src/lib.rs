//! Core types and shared functionality for herodex.
//!
//! This crate provides:
//! - The request/response model with streaming bodies
//! - The bucketed cache store (in-memory and SQLite backends)
//! - Asset manifest, bucket naming and request classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod manifest;
pub mod message;

pub use cache::{BucketNames, BucketRole, CacheKey, CacheStore, CachedResponse, MemoryStore, SqliteStore};
pub use classify::{Classification, Classifier, StrategyKind};
pub use config::{AppConfig, SitePaths, StoreBackend};
pub use error::Error;
pub use manifest::AssetManifest;
pub use message::{Body, Request, Response, ResponseType};
