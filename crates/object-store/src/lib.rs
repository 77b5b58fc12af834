//! Object Storage Backend
//!
//! This crate provides the physical blob layer for strata: a small
//! [`BlobStorage`] contract (put/get/delete/exists/list keyed by an opaque
//! [`BlobId`]) and an [`ObjectStore`] implementation over pluggable object
//! storage (S3/MinIO/local filesystem/memory).
//!
//! Nothing here knows about paths, owners or reference counts; the
//! filesystem engine in `strata-common` layers those on top.
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_object_store::{BlobId, BlobStorage, ObjectStore, ObjectStoreConfig};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), strata_object_store::BlobStoreError> {
//! let store = ObjectStore::new(ObjectStoreConfig::Local {
//!     path: PathBuf::from("/tmp/blobs"),
//! })
//! .await?;
//!
//! let id = BlobId::generate();
//! store.put(&id, "hello".into()).await?;
//! assert_eq!(store.get(&id).await?.as_ref(), b"hello");
//! # Ok(())
//! # }
//! ```

mod blob_id;
mod blob_storage;
mod error;
mod storage;

pub use blob_id::BlobId;
pub use blob_storage::BlobStorage;
pub use error::{BlobStoreError, Result};
pub use storage::{ObjectStore, ObjectStoreConfig};
