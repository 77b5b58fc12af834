//! Object storage backend abstraction (S3/MinIO/local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blob_id::BlobId;
use crate::blob_storage::BlobStorage;
use crate::error::{BlobStoreError, Result};

const DATA_PREFIX: &str = "data";

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Blob storage on top of any [`object_store::ObjectStore`] backend.
///
/// Blob bytes live at `data/<blob id>` inside the backend.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    inner: Arc<dyn object_store::ObjectStore>,
}

impl ObjectStore {
    /// Create a new storage backend from configuration.
    pub async fn new(config: ObjectStoreConfig) -> Result<Self> {
        let inner: Arc<dyn object_store::ObjectStore> = match &config {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()),

            ObjectStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?,
                )
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                let store: Arc<dyn object_store::ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?,
                );

                // Fail fast if the bucket doesn't exist
                ensure_bucket(store.as_ref(), bucket).await?;

                store
            }
        };

        Ok(Self { inner })
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Build the object path for blob data.
    fn data_path(id: &BlobId) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", DATA_PREFIX, id))
    }
}

/// Check that an S3 bucket exists by listing it with an empty prefix.
async fn ensure_bucket(store: &dyn object_store::ObjectStore, bucket: &str) -> Result<()> {
    let prefix = ObjectPath::from("");
    let first = store.list(Some(&prefix)).try_next().await;
    match first {
        Ok(_) => Ok(()),
        Err(object_store::Error::NotFound { .. }) => {
            Err(BlobStoreError::BucketNotFound(bucket.to_string()))
        }
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("NoSuchBucket") || msg.contains("bucket") && msg.contains("not") {
                return Err(BlobStoreError::BucketNotFound(bucket.to_string()));
            }
            Err(e.into())
        }
    }
}

#[async_trait]
impl BlobStorage for ObjectStore {
    async fn put(&self, id: &BlobId, data: Bytes) -> Result<()> {
        let path = Self::data_path(id);
        let size = data.len();
        self.inner.put(&path, data.into()).await?;
        debug!(blob_id = %id, size, "blob bytes stored");
        Ok(())
    }

    async fn get(&self, id: &BlobId) -> Result<Bytes> {
        let path = Self::data_path(id);
        match self.inner.get(&path).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => {
                Err(BlobStoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &BlobId) -> Result<()> {
        let path = Self::data_path(id);
        // Ignore NotFound errors - the blob may already be deleted
        match self.inner.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(blob_id = %id, "blob bytes deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, id: &BlobId) -> Result<bool> {
        let path = Self::data_path(id);
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<BlobId>> {
        let prefix = ObjectPath::from(DATA_PREFIX);
        let items: Vec<_> = self.inner.list(Some(&prefix)).try_collect().await?;

        let ids = items
            .into_iter()
            .filter_map(|meta| {
                meta.location
                    .as_ref()
                    .strip_prefix(DATA_PREFIX)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .map(BlobId::from)
            })
            .collect();

        Ok(ids)
    }
}
