//! Object storage for profile images and project banners.
//!
//! Uploads are upserts keyed by a deterministic path, so re-uploading
//! replaces the previous object and the public URL stays stable.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StoreConfig;

pub const PROFILE_IMAGES_BUCKET: &str = "profile-images";
pub const PROJECT_BANNERS_BUCKET: &str = "project-banners";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File name has no extension: {0}")]
    MissingExtension(String),

    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or replace the object at `path` in `bucket`
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Client for the hosted storage REST API
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl HttpObjectStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StorageError> {
        let base = url::Url::parse(&config.url).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            key: config.key.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        let size = bytes.len();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Upload of {}/{} failed with {}: {}", bucket, path, status, body);
            return Err(StorageError::Rejected { status: status.as_u16(), body });
        }

        tracing::info!("Uploaded {}/{} ({} bytes)", bucket, path, size);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process object store for tests and local runs
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(&(bucket.to_string(), path.to_string())).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.objects.write().await.insert(
            (bucket.to_string(), path.to_string()),
            StoredObject { bytes, content_type: content_type.to_string() },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url.trim_end_matches('/'), bucket, path)
    }
}

/// Lowercased extension of an uploaded file name
pub fn file_extension(file_name: &str) -> Result<String, StorageError> {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(ext.to_ascii_lowercase())
        }
        _ => Err(StorageError::MissingExtension(file_name.to_string())),
    }
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn profile_image_path(username: &str, extension: &str) -> String {
    format!("profiles/{}.{}", username, extension)
}

pub fn project_banner_path(project_id: Uuid, extension: &str) -> String {
    format!("banners/{}.{}", project_id, extension)
}
