//! Install and activate.

use std::sync::Arc;

use futures::future::try_join_all;
use http::StatusCode;
use url::Url;

use herodex_client::{Network, site_url};
use herodex_core::{AssetManifest, BucketNames, CacheKey, CacheStore, CachedResponse, Error, Request};

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub bucket: String,
    /// `(path, sha256)` per manifest entry, in manifest order.
    pub assets: Vec<(String, String)>,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Clone)]
pub struct Lifecycle {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    buckets: BucketNames,
    manifest: AssetManifest,
    origin: Url,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn Network>, buckets: BucketNames, manifest: AssetManifest,
        origin: Url,
    ) -> Self {
        Self { store, network, buckets, manifest, origin }
    }

    /// Precache every manifest asset into the current app bucket.
    ///
    /// All assets are fetched before anything is written, so a failed install
    /// leaves the store untouched.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let bucket = self.buckets.current_app();
        tracing::info!(bucket = %bucket, version = self.buckets.version(), assets = self.manifest.len(), "installing");

        let fetched = try_join_all(self.manifest.iter().map(|path| self.fetch_asset(path))).await?;

        self.store.open(&bucket).await?;
        let mut assets = Vec::with_capacity(fetched.len());
        for (path, key, cached) in fetched {
            let digest = cached.digest.clone();
            self.store.put(&bucket, &key, cached).await?;
            assets.push((path, digest));
        }

        tracing::info!(bucket = %bucket, assets = assets.len(), "install complete");
        Ok(InstallReport { bucket, assets })
    }

    async fn fetch_asset(&self, path: &str) -> Result<(String, CacheKey, CachedResponse), Error> {
        let failure = |reason: String| Error::InstallFailure(format!("{path}: {reason}"));

        let url = site_url(&self.origin, path).map_err(|e| failure(e.to_string()))?;
        let request = Request::get(url);
        let response = self.network.fetch(&request).await.map_err(|e| failure(e.to_string()))?;
        if response.status != StatusCode::OK {
            return Err(failure(format!("status {}", response.status.as_u16())));
        }

        let url = response.url.clone().unwrap_or_else(|| request.url.clone());
        let status = response.status;
        let headers = response.headers.clone();
        let body = response.bytes().await.map_err(|e| failure(e.to_string()))?;

        tracing::debug!(path, bytes = body.len(), "fetched manifest asset");
        Ok((path.to_string(), request.key(), CachedResponse::new(&url, status, &headers, body)))
    }

    /// Delete every app bucket from an older version. Article and image
    /// buckets are kept; failures are logged and skipped.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let mut report = ActivateReport::default();

        for name in self.store.bucket_names().await? {
            if !self.buckets.is_stale_app(&name) {
                continue;
            }
            match self.store.delete(&name).await {
                Ok(_) => {
                    tracing::info!(bucket = %name, "deleted stale bucket");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(bucket = %name, error = %e, "failed to delete stale bucket");
                    report.failed.push(name);
                }
            }
        }

        tracing::info!(current = %self.buckets.current_app(), deleted = report.deleted.len(), "activated");
        Ok(report)
    }
}
