//! Bucket roles and the versioned naming convention.

use serde::{Deserialize, Serialize};

/// Logical role of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketRole {
    /// Precached manifest assets. Versioned.
    App,
    /// Content fragments and JSON data. Versionless.
    Article,
    /// Images fetched on demand. Versionless.
    Image,
}

/// Concrete bucket names for one deployed version.
///
/// The app bucket is `<app_role>-<version>`; any other bucket carrying the
/// `<app_role>-` prefix belongs to an older deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNames {
    app_role: String,
    version: String,
    article: String,
    image: String,
}

impl BucketNames {
    pub fn new(
        app_role: impl Into<String>, version: impl Into<String>, article: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self { app_role: app_role.into(), version: version.into(), article: article.into(), image: image.into() }
    }

    pub fn current_app(&self) -> String {
        format!("{}-{}", self.app_role, self.version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name_for(&self, role: BucketRole) -> String {
        match role {
            BucketRole::App => self.current_app(),
            BucketRole::Article => self.article.clone(),
            BucketRole::Image => self.image.clone(),
        }
    }

    /// Whether `name` is an app bucket from a different version.
    pub fn is_stale_app(&self, name: &str) -> bool {
        let prefixed = name
            .strip_prefix(self.app_role.as_str())
            .is_some_and(|rest| rest.starts_with('-'));
        prefixed && name != self.current_app()
    }
}
