//! Bucketed response cache.
//!
//! Responses are stored per bucket under their request URL. Two backends
//! implement [`CacheStore`]:
//!
//! - [`MemoryStore`] for tests and ephemeral runs
//! - [`SqliteStore`], persistent, with WAL mode and schema migrations
//!
//! Neither backend locks across requests. Concurrent puts to the same key
//! race and the last write wins.

pub mod buckets;
pub mod connection;
pub mod entries;
pub mod hash;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use buckets::{BucketNames, BucketRole};
pub use connection::SqliteStore;
pub use key::CacheKey;
pub use memory::MemoryStore;
pub use store::{CacheStore, CachedResponse};
