//! [`CacheStore`] operations backed by SQLite.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::SqliteStore;
use super::key::CacheKey;
use super::store::{CacheStore, CachedResponse};
use crate::Error;

const ENTRY_COLUMNS: &str = "e.url, e.status, e.headers_json, e.body, e.body_sha256, e.stored_at";

/// Entry row as stored, before header decoding.
struct EntryRow {
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
    digest: String,
    stored_at: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            status: row.get(1)?,
            headers_json: row.get(2)?,
            body: row.get(3)?,
            digest: row.get(4)?,
            stored_at: row.get(5)?,
        })
    }

    fn into_cached(self) -> Result<CachedResponse, Error> {
        Ok(CachedResponse {
            url: self.url,
            status: self.status,
            headers: serde_json::from_str(&self.headers_json)?,
            body: Bytes::from(self.body),
            digest: self.digest,
            stored_at: self.stored_at,
        })
    }
}

fn lookup(conn: &rusqlite::Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Option<CachedResponse>, Error> {
    let mut stmt = conn.prepare(sql)?;
    match stmt.query_row(params, EntryRow::from_row) {
        Ok(row) => Ok(Some(row.into_cached()?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, bucket: &str, key: &CacheKey) -> Result<Option<CachedResponse>, Error> {
        let bucket = bucket.to_string();
        let key = key.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.bucket = ?1 AND e.key = ?2");
                lookup(conn, &sql, params![bucket, key])
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &CacheKey) -> Result<Option<CachedResponse>, Error> {
        let key = key.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries e
                     JOIN buckets b ON b.name = e.bucket
                     WHERE e.key = ?1
                     ORDER BY b.rowid ASC LIMIT 1"
                );
                lookup(conn, &sql, params![key])
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, bucket: &str, key: &CacheKey, response: CachedResponse) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let key = key.as_str().to_string();
        let headers_json = serde_json::to_string(&response.headers)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![&bucket, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        bucket, key, url, status, headers_json, body, body_sha256, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(bucket, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        body_sha256 = excluded.body_sha256,
                        stored_at = excluded.stored_at",
                    params![
                        &bucket,
                        &key,
                        &response.url,
                        response.status,
                        &headers_json,
                        &response.body[..],
                        &response.digest,
                        &response.stored_at,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM buckets WHERE name = ?1", params![bucket])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<CacheKey>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheKey>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE bucket = ?1 ORDER BY key ASC")?;
                let keys = stmt
                    .query_map(params![bucket], |row| row.get::<_, String>(0))?
                    .map(|key| key.map(CacheKey::from_stored))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use http::StatusCode;
    use url::Url;

    fn entry(url: &str, body: &'static str) -> (CacheKey, CachedResponse) {
        let url = Url::parse(url).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        (CacheKey::from_url(&url), CachedResponse::new(&url, StatusCode::OK, &headers, Bytes::from(body)))
    }

    #[tokio::test]
    async fn test_put_and_match_in() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        let (key, response) = entry("https://herodex.test/site-shell-top.part.html", "<html>");

        db.put("app-v1", &key, response.clone()).await.unwrap();

        let hit = db.match_in("app-v1", &key).await.unwrap().unwrap();
        assert_eq!(hit, response);
        assert_eq!(hit.headers, vec![("content-type".to_string(), "text/html".to_string())]);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        let (key, _) = entry("https://herodex.test/missing.css", "");
        assert!(db.match_any(&key).await.unwrap().is_none());
        assert!(db.match_in("app-v1", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        let (key, first) = entry("https://herodex.test/thor-content.part.html", "old");
        let (_, second) = entry("https://herodex.test/thor-content.part.html", "new");

        db.put("article", &key, first).await.unwrap();
        db.put("article", &key, second).await.unwrap();

        let hit = db.match_any(&key).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from("new"));
        assert_eq!(db.keys("article").await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_bucket() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        let (key, older) = entry("https://herodex.test/a.json", "older");
        let (_, newer) = entry("https://herodex.test/a.json", "newer");

        db.open("first").await.unwrap();
        db.open("second").await.unwrap();
        db.put("second", &key, newer).await.unwrap();
        db.put("first", &key, older).await.unwrap();

        let hit = db.match_any(&key).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from("older"));
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        let (key, response) = entry("https://herodex.test/css/main.css", "css");
        db.put("app-v1", &key, response).await.unwrap();
        db.open("image").await.unwrap();

        assert!(db.delete("app-v1").await.unwrap());
        assert!(!db.delete("app-v1").await.unwrap());
        assert!(db.match_any(&key).await.unwrap().is_none());
        assert_eq!(db.bucket_names().await.unwrap(), vec!["image".to_string()]);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        db.open("app-v1").await.unwrap();
        db.open("app-v1").await.unwrap();
        assert_eq!(db.bucket_names().await.unwrap(), vec!["app-v1".to_string()]);
        assert!(db.keys("app-v1").await.unwrap().is_empty());
        assert_eq!(db.name(), "sqlite");
    }
}
