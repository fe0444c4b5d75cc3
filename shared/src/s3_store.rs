use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use vst_atoms::{ObjectStore, PresignedUpload, StoreError, StoredObject};

/// Object store backed by a single S3 bucket served from `public_base_url`.
#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                tracing::error!("S3 upload error for {}: {:?}", key, err);
                StoreError::Transport(format!("upload of {} failed: {}", key, err))
            })?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
        })
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let object = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(object) => object,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(StoreError::Transport(format!("fetch of {} failed: {}", key, err)));
            }
        };

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Transport(format!("reading {} failed: {}", key, e)))?;
        Ok(Some(data.into_bytes().to_vec()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = e.into_service_error();
                if err.is_not_found() {
                    return Ok(false);
                }
                Err(StoreError::Transport(format!("head of {} failed: {}", key, err)))
            }
        }
    }

    async fn destroy(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                StoreError::Transport(format!("delete of {} failed: {}", key, e.into_service_error()))
            })?;
        Ok(())
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in: Duration,
    ) -> Result<PresignedUpload, StoreError> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(|e| StoreError::Presign(e.to_string()))?;
        let ttl = chrono::Duration::from_std(expires_in).map_err(|e| StoreError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .presigned(presigning_config)
            .await
            .map_err(|e| StoreError::Presign(e.to_string()))?;

        Ok(PresignedUpload {
            upload_url: presigned_req.uri().to_string(),
            method: presigned_req.method().to_string(),
            key: key.to_string(),
            public_url: self.public_url(key),
            expires_at: (chrono::Utc::now() + ttl).to_rfc3339(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
