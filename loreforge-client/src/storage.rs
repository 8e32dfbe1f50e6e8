//! Object-storage client for uploaded media files.
//!
//! Uploads go to the backend's storage API under the configured bucket;
//! public URLs are derived, not fetched. Object paths are generated with
//! a millisecond timestamp and a random suffix so concurrent uploads of
//! identically named files never collide.

use crate::auth::AuthClient;
use crate::config::BackendConfig;
use crate::error::{DataError, DataResult};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const LIST_LIMIT: u32 = 100;

/// Result of a completed upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResult {
    pub path: String,
    pub public_url: String,
}

/// One object in a bucket folder listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub name: String,
    pub path: String,
    pub public_url: String,
}

/// Client for the backend object-storage API.
pub struct StorageClient {
    client: Client,
    config: BackendConfig,
    auth: Arc<AuthClient>,
}

impl StorageClient {
    pub fn new(config: BackendConfig, auth: Arc<AuthClient>) -> DataResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            auth,
        })
    }

    async fn bearer_token(&self) -> String {
        self.auth
            .access_token()
            .await
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    /// Uploads a file into the given folder and returns its storage path
    /// and public URL.
    pub async fn upload(
        &self,
        folder: &str,
        original_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> DataResult<UploadResult> {
        let path = unique_object_path(folder, original_name);
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.config.base_url, self.config.storage_bucket
        );
        let size = bytes.len();
        let token = self.bearer_token().await;

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .header("content-type", mime_type)
            .header("cache-control", "max-age=3600")
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DataError::Storage(format!(
                "upload failed for {path}: {}",
                resp.status()
            )));
        }

        debug!("uploaded {size} bytes to {}/{path}", self.config.storage_bucket);
        Ok(UploadResult {
            public_url: self.public_url(&path),
            path,
        })
    }

    /// Public URL for an object path. Derived locally; no request.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.config.base_url, self.config.storage_bucket
        )
    }

    /// Lists the objects in a bucket folder, newest first. An empty
    /// folder string lists the bucket root.
    pub async fn list(&self, folder: &str) -> DataResult<Vec<StoredObject>> {
        #[derive(Deserialize)]
        struct ObjectRow {
            name: String,
        }

        let url = format!(
            "{}/storage/v1/object/list/{}",
            self.config.base_url, self.config.storage_bucket
        );
        let token = self.bearer_token().await;

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "prefix": folder,
                "limit": LIST_LIMIT,
                "offset": 0,
                "sortBy": { "column": "created_at", "order": "desc" },
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DataError::Storage(format!(
                "listing {folder:?} failed: {}",
                resp.status()
            )));
        }

        let rows: Vec<ObjectRow> = resp.json().await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let path = if folder.is_empty() {
                    row.name.clone()
                } else {
                    format!("{folder}/{}", row.name)
                };
                StoredObject {
                    name: row.name,
                    public_url: self.public_url(&path),
                    path,
                }
            })
            .collect())
    }

    /// Removes an object.
    pub async fn delete(&self, path: &str) -> DataResult<()> {
        let url = format!(
            "{}/storage/v1/object/{}",
            self.config.base_url, self.config.storage_bucket
        );
        let token = self.bearer_token().await;

        let resp = self
            .client
            .delete(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DataError::Storage(format!(
                "delete failed for {path}: {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Builds a collision-free object path preserving the file extension.
/// Extensionless names get a generic `.bin`.
fn unique_object_path(folder: &str, original_name: &str) -> String {
    let ext = match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => "bin",
    };
    let stamp = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{folder}/{stamp}-{}.{ext}", &suffix[..8])
}
