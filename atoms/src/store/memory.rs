use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ObjectStore, PresignedUpload, StoreError, StoredObject};

/// Process-local object store used for `MEDIA_BACKEND=memory` and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
    base_url: String,
}

#[derive(Debug, Default)]
struct MemoryInner {
    objects: HashMap<String, Vec<u8>>,
    rejected_fragments: Vec<String>,
    destroyed: Vec<String>,
    failing_destroys: bool,
    offline: bool,
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Uploads whose key contains `fragment` fail with `StoreError::Rejected`.
    pub fn reject_uploads_containing(&self, fragment: impl Into<String>) {
        self.lock().rejected_fragments.push(fragment.into());
    }

    /// `destroy` fails while set; everything else keeps working.
    pub fn fail_destroys(&self, failing: bool) {
        self.lock().failing_destroys = failing;
    }

    /// Every operation fails with a transport error while offline.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn put_raw(&self, key: &str, bytes: impl Into<Vec<u8>>) {
        self.lock().objects.insert(key.to_string(), bytes.into());
    }

    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().objects.contains_key(key)
    }

    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn destroyed_keys(&self) -> Vec<String> {
        self.lock().destroyed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.lock().offline {
            return Err(StoreError::Transport("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<StoredObject, StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        if let Some(fragment) = inner.rejected_fragments.iter().find(|f| key.contains(f.as_str())) {
            return Err(StoreError::Rejected {
                key: key.to_string(),
                reason: format!("uploads matching '{}' are rejected", fragment),
            });
        }
        inner.objects.insert(key.to_string(), bytes);
        drop(inner);

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
        })
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_online()?;
        Ok(self.get_raw(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check_online()?;
        Ok(self.contains(key))
    }

    async fn destroy(&self, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut inner = self.lock();
        if inner.failing_destroys {
            return Err(StoreError::Transport(format!("destroy of {} failed", key)));
        }
        inner.objects.remove(key);
        inner.destroyed.push(key.to_string());
        Ok(())
    }

    async fn presign_upload(
        &self,
        key: &str,
        _content_type: Option<&str>,
        expires_in: Duration,
    ) -> Result<PresignedUpload, StoreError> {
        self.check_online()?;
        let ttl = chrono::Duration::from_std(expires_in)
            .map_err(|e| StoreError::Presign(e.to_string()))?;
        let expires_at = chrono::Utc::now() + ttl;

        Ok(PresignedUpload {
            upload_url: format!("{}?expires={}", self.public_url(key), expires_at.timestamp()),
            method: "PUT".to_string(),
            key: key.to_string(),
            public_url: self.public_url(key),
            expires_at: expires_at.to_rfc3339(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
