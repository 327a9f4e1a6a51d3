//! In-process store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::key::CacheKey;
use super::store::{CacheStore, CachedResponse};
use crate::Error;

type Bucket = HashMap<CacheKey, CachedResponse>;

/// Store that keeps every bucket in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    // Vec keeps creation order for `match_any`.
    buckets: RwLock<Vec<(String, Bucket)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|(name, _)| name == bucket) {
            buckets.push((bucket.to_string(), Bucket::new()));
        }
        Ok(())
    }

    async fn match_in(&self, bucket: &str, key: &CacheKey) -> Result<Option<CachedResponse>, Error> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|(name, _)| name == bucket)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn match_any(&self, key: &CacheKey) -> Result<Option<CachedResponse>, Error> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().find_map(|(_, entries)| entries.get(key).cloned()))
    }

    async fn put(&self, bucket: &str, key: &CacheKey, response: CachedResponse) -> Result<(), Error> {
        let mut buckets = self.buckets.write().await;
        match buckets.iter_mut().find(|(name, _)| name == bucket) {
            Some((_, entries)) => {
                entries.insert(key.clone(), response);
            }
            None => {
                let mut entries = Bucket::new();
                entries.insert(key.clone(), response);
                buckets.push((bucket.to_string(), entries));
            }
        }
        Ok(())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|(name, _)| name != bucket);
        Ok(buckets.len() != before)
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.buckets.read().await.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<CacheKey>, Error> {
        let buckets = self.buckets.read().await;
        let mut keys: Vec<CacheKey> = buckets
            .iter()
            .find(|(name, _)| name == bucket)
            .map(|(_, entries)| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use url::Url;

    fn entry(url: &str, body: &'static str) -> (CacheKey, CachedResponse) {
        let url = Url::parse(url).unwrap();
        (CacheKey::from_url(&url), CachedResponse::new(&url, StatusCode::OK, &HeaderMap::new(), Bytes::from(body)))
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let store = MemoryStore::new();
        store.open("app-v1").await.unwrap();
        store.open("app-v1").await.unwrap();
        assert_eq!(store.bucket_names().await.unwrap(), vec!["app-v1".to_string()]);
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let store = MemoryStore::new();
        let (key, response) = entry("https://herodex.test/a.png", "png");
        store.put("image", &key, response.clone()).await.unwrap();

        assert_eq!(store.match_in("image", &key).await.unwrap(), Some(response.clone()));
        assert_eq!(store.match_any(&key).await.unwrap(), Some(response));
        assert!(store.match_in("article", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        let (key, first) = entry("https://herodex.test/a-content.part.html", "old");
        let (_, second) = entry("https://herodex.test/a-content.part.html", "new");
        store.put("article", &key, first).await.unwrap();
        store.put("article", &key, second).await.unwrap();

        let hit = store.match_any(&key).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from("new"));
        assert_eq!(store.keys("article").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_bucket() {
        let store = MemoryStore::new();
        let (key, older) = entry("https://herodex.test/x.json", "older");
        let (_, newer) = entry("https://herodex.test/x.json", "newer");
        store.open("first").await.unwrap();
        store.open("second").await.unwrap();
        store.put("second", &key, newer).await.unwrap();
        store.put("first", &key, older).await.unwrap();

        let hit = store.match_any(&key).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from("older"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let (key, response) = entry("https://herodex.test/css/main.css", "css");
        store.put("app-v1", &key, response).await.unwrap();

        assert!(store.delete("app-v1").await.unwrap());
        assert!(!store.delete("app-v1").await.unwrap());
        assert!(store.match_any(&key).await.unwrap().is_none());
        assert!(store.keys("app-v1").await.unwrap().is_empty());
    }
}
