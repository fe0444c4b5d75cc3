use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Object store errors. Missing objects are not errors; `fetch` returns `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upload rejected for {key}: {reason}")]
    Rejected { key: String, reason: String },

    #[error("presign error: {0}")]
    Presign(String),
}

/// Result of a successful upload. `key` doubles as the item's external id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Time-boxed credential the browser uses to upload bytes directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub method: String,
    pub key: String,
    pub public_url: String,
    pub expires_at: String,
}

/// One file received from an admin form, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Hosted object storage holding media bytes and the JSON documents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, StoreError>;

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// True when an object is stored under `key`, without reading its bytes.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Deleting a key that does not exist succeeds.
    async fn destroy(&self, key: &str) -> Result<(), StoreError>;

    async fn presign_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in: Duration,
    ) -> Result<PresignedUpload, StoreError>;

    /// Public URL an object under `key` is served from.
    fn public_url(&self, key: &str) -> String;
}

/// Builds `{folder}/{millis}-{suffix}-{file_name}` with whitespace and path
/// separators in the file name folded to `_`.
pub fn object_key(folder: &str, file_name: &str) -> String {
    let flattened = file_name.replace(['/', '\\'], " ");
    let cleaned = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = if cleaned.is_empty() { "upload".to_string() } else { cleaned };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}-{}-{}",
        folder.trim_end_matches('/'),
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8],
        cleaned
    )
}
