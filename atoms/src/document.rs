use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::GalleryError;
use crate::store::{ObjectStore, StoreError};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("document {key} is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error("document {key} has unsupported schema version {version}")]
    UnsupportedVersion { key: String, version: u64 },
}

impl From<DocumentError> for GalleryError {
    fn from(err: DocumentError) -> Self {
        GalleryError::upstream(err.to_string())
    }
}

/// A JSON document persisted whole as a single object in the store.
///
/// Documents carry a `version` field. A document without one predates the
/// versioned schema and goes through `migrate_legacy` exactly once, on the next
/// write it is saved back in the current shape.
pub trait VersionedDocument: Default + Serialize + DeserializeOwned {
    const VERSION: u64;

    fn migrate_legacy(value: Value) -> Result<Self, String>;
}

pub fn decode<D: VersionedDocument>(key: &str, value: Value) -> Result<D, DocumentError> {
    let malformed = |reason: String| DocumentError::Malformed {
        key: key.to_string(),
        reason,
    };

    match value.get("version").map(Value::as_u64) {
        None => D::migrate_legacy(value).map_err(malformed),
        Some(Some(version)) if version == D::VERSION => {
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
        }
        Some(Some(version)) if version > D::VERSION => Err(DocumentError::UnsupportedVersion {
            key: key.to_string(),
            version,
        }),
        Some(_) => Err(malformed("version must be a supported integer".to_string())),
    }
}

async fn load<D: VersionedDocument>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Option<D>, DocumentError> {
    let Some(bytes) = store.fetch(key).await? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| DocumentError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    decode(key, value).map(Some)
}

/// Read path: every failure degrades to an empty document.
pub async fn load_or_default<D: VersionedDocument>(store: &dyn ObjectStore, key: &str) -> D {
    match load(store, key).await {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            tracing::debug!("Document {} not found, treating as first run", key);
            D::default()
        }
        Err(e) => {
            tracing::warn!("Serving empty document for {}: {}", key, e);
            D::default()
        }
    }
}

/// Mutation path: only a missing document is treated as empty. Anything that
/// could not be read must not be overwritten.
pub async fn load_for_update<D: VersionedDocument>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<D, GalleryError> {
    match load(store, key).await {
        Ok(doc) => Ok(doc.unwrap_or_default()),
        Err(e) => {
            tracing::error!("Refusing to modify {}: {}", key, e);
            Err(e.into())
        }
    }
}

pub async fn save<D: VersionedDocument>(
    store: &dyn ObjectStore,
    key: &str,
    doc: &D,
) -> Result<(), GalleryError> {
    let bytes = serde_json::to_vec_pretty(doc)
        .map_err(|e| GalleryError::upstream(format!("failed to encode {}: {}", key, e)))?;
    store.upload(key, bytes, Some("application/json")).await?;
    Ok(())
}
