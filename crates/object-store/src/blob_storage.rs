//! The contract every physical blob backend implements.

use async_trait::async_trait;
use bytes::Bytes;

use crate::blob_id::BlobId;
use crate::error::Result;

/// Content-addressed byte storage keyed by an opaque [`BlobId`].
///
/// Implementations only move bytes. Deciding *when* a blob may be deleted is
/// the caller's job: the filesystem engine deletes a blob only after its
/// reference count has dropped to zero.
#[async_trait]
pub trait BlobStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Store `data` under `id`, replacing anything already there.
    async fn put(&self, id: &BlobId, data: Bytes) -> Result<()>;

    /// Fetch the bytes stored under `id`.
    ///
    /// Fails with [`BlobStoreError::NotFound`](crate::BlobStoreError::NotFound)
    /// if nothing is stored there.
    async fn get(&self, id: &BlobId) -> Result<Bytes>;

    /// Remove the bytes stored under `id`. Deleting a missing blob succeeds.
    async fn delete(&self, id: &BlobId) -> Result<()>;

    /// Whether bytes are stored under `id`.
    async fn exists(&self, id: &BlobId) -> Result<bool>;

    /// Every blob id currently held by the backend.
    async fn list(&self) -> Result<Vec<BlobId>>;
}
