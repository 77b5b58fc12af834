//! The filesystem engine.
//!
//! A [`Store`] owns the shared collaborators (metadata database, blob
//! storage, content-type resolver). Callers open a [`FileSystem`] session per
//! owner; the session carries that owner's working directory and exposes the
//! tree operations.
//!
//! Every mutating operation runs inside one database transaction. Helpers
//! that make up an operation take the transaction's connection, so nested
//! steps (the per-file writes of a directory copy, say) share it. Dropping
//! the transaction without committing rolls everything back, which is how an
//! error anywhere in an operation leaves the tree untouched.
//!
//! Reference counts are decremented inside the transaction. Blobs that fall
//! to zero are collected into a pending list and physically reclaimed only
//! after the commit succeeds; a failed reclamation is logged and left for
//! the [`OrphanCollector`].

mod directory;
mod error;
mod file;
mod gc;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use object_store::{BlobId, BlobStorage, ObjectStore, ObjectStoreConfig};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::content_type::{is_textual, ContentTypeResolver, GuessFromExtension};
use crate::database::{BlobStats, Database, DatabaseConnection};
use crate::hash::ContentHash;
use crate::model::{Blob, Node, NodeType, OwnerId};
use crate::path;

pub use error::{ErrorKind, FsError};
pub use gc::{OrphanCollector, SweepReport};

pub type Result<T> = std::result::Result<T, FsError>;

/// Shared state behind every session: the metadata index, the blob store and
/// the content-type resolver.
#[derive(Clone, Debug)]
pub struct Store {
    db: Database,
    storage: Arc<dyn BlobStorage>,
    content_types: Arc<dyn ContentTypeResolver>,
}

impl Store {
    pub fn new(db: Database, storage: Arc<dyn BlobStorage>) -> Self {
        Self {
            db,
            storage,
            content_types: Arc::new(GuessFromExtension),
        }
    }

    pub fn with_content_types(mut self, resolver: Arc<dyn ContentTypeResolver>) -> Self {
        self.content_types = resolver;
        self
    }

    /// Open a store with a file-backed database and the configured blob backend.
    pub async fn open(db_path: &Path, blob_store: ObjectStoreConfig) -> Result<Self> {
        let db = Database::connect(db_path).await?;
        let storage = ObjectStore::new(blob_store).await?;
        Ok(Self::new(db, Arc::new(storage)))
    }

    /// A store that lives only in memory.
    pub async fn ephemeral() -> Result<Self> {
        let db = Database::in_memory().await?;
        Ok(Self::new(db, Arc::new(ObjectStore::memory())))
    }

    /// Open a session for `owner`, starting at the root.
    pub fn session(&self, owner: impl Into<OwnerId>) -> Result<FileSystem> {
        let owner = owner.into();
        if owner.as_str().trim().is_empty() {
            return Err(FsError::InvalidArgument("owner id must not be empty".into()));
        }
        Ok(FileSystem {
            store: self.clone(),
            owner,
            cwd: path::ROOT.to_string(),
        })
    }

    pub fn orphan_collector(&self) -> OrphanCollector {
        OrphanCollector::new(self.db.clone(), self.storage.clone())
    }

    pub async fn stats(&self) -> Result<BlobStats> {
        let mut conn = self.db.acquire().await?;
        Ok(Blob::stats(&mut conn).await?)
    }

    pub async fn blob_by_hash(&self, hash: &ContentHash) -> Result<Option<Blob>> {
        let mut conn = self.db.acquire().await?;
        Ok(Blob::find_by_hash(hash, &mut conn).await?)
    }

    pub async fn blob(&self, blob_id: &BlobId) -> Result<Option<Blob>> {
        let mut conn = self.db.acquire().await?;
        Ok(Blob::get(blob_id, &mut conn).await?)
    }

    pub async fn blobs(&self) -> Result<Vec<Blob>> {
        let mut conn = self.db.acquire().await?;
        Ok(Blob::all(&mut conn).await?)
    }

    pub fn blob_storage(&self) -> &Arc<dyn BlobStorage> {
        &self.storage
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Physically reclaim blobs whose count dropped to zero in a committed
    /// operation. Failures are logged; the orphan collector retries them.
    async fn reclaim(&self, mut pending: Vec<BlobId>) {
        pending.sort();
        pending.dedup();
        for blob_id in pending {
            match gc::reclaim_blob(&self.db, self.storage.as_ref(), &blob_id).await {
                Ok(true) => debug!(blob_id = %blob_id, "reclaimed blob"),
                Ok(false) => debug!(blob_id = %blob_id, "blob referenced again, not reclaimed"),
                Err(e) => warn!(
                    blob_id = %blob_id,
                    error = %e,
                    "failed to reclaim blob; leaving it for the orphan collector"
                ),
            }
        }
    }
}

/// File content together with its recorded content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Bytes,
    pub content_type: String,
}

impl FileContent {
    pub fn is_text(&self) -> bool {
        is_textual(&self.content_type)
    }

    /// The content as UTF-8, if its type is textual and the bytes decode.
    pub fn as_text(&self) -> Option<&str> {
        if !self.is_text() {
            return None;
        }
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// One owner's view of the tree, with its own working directory.
#[derive(Clone, Debug)]
pub struct FileSystem {
    store: Store,
    owner: OwnerId,
    cwd: String,
}

impl FileSystem {
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn working_directory(&self) -> &str {
        &self.cwd
    }

    /// Canonical absolute form of `path` relative to the working directory.
    pub fn resolve(&self, path: &str) -> String {
        path::resolve(&self.cwd, path)
    }

    /// Change the working directory. The target must be an existing directory.
    pub async fn set_working_directory(&mut self, path: &str) -> Result<()> {
        let path = self.resolve(path);
        let node = self.lookup(&path).await?;
        if !node.is_some_and(|n| n.is_dir()) {
            return Err(FsError::NotFound(path));
        }
        debug!(owner = %self.owner, cwd = %path, "working directory changed");
        self.cwd = path;
        Ok(())
    }

    /// Metadata for the node at `path`, without its content.
    pub async fn get_info(&self, path: &str) -> Result<Node> {
        let path = self.resolve(path);
        self.lookup(&path)
            .await?
            .ok_or_else(|| FsError::NotFound(path))
    }

    /// Point lookup that materializes the root when asked for it.
    async fn lookup(&self, path: &str) -> Result<Option<Node>> {
        if path::is_root(path) {
            let mut tx = self.store.db.begin().await?;
            Node::ensure_root(&self.owner, OffsetDateTime::now_utc(), &mut tx).await?;
            let node = Node::get(&self.owner, path, &mut tx).await?;
            tx.commit().await?;
            return Ok(node);
        }
        let mut conn = self.store.db.acquire().await?;
        Ok(Node::get(&self.owner, path, &mut conn).await?)
    }

    /// Create every missing ancestor directory of `path`.
    ///
    /// Walks up until an existing directory is found, then inserts the
    /// missing ones top-down. A file anywhere in the chain is a type mismatch.
    async fn ensure_parents(
        &self,
        path: &str,
        now: OffsetDateTime,
        conn: &mut DatabaseConnection,
    ) -> Result<()> {
        let mut missing = Vec::new();
        for ancestor in path::ancestors(path) {
            match Node::get(&self.owner, &ancestor, conn).await? {
                Some(node) if node.is_dir() => break,
                Some(_) => return Err(FsError::type_mismatch(ancestor, NodeType::Directory)),
                None => missing.push(ancestor),
            }
        }

        for ancestor in missing.into_iter().rev() {
            if path::is_root(&ancestor) {
                Node::ensure_root(&self.owner, now, conn).await?;
            } else {
                debug!(owner = %self.owner, path = %ancestor, "creating parent directory");
                Node::directory(&self.owner, &ancestor, now)
                    .insert(conn)
                    .await?;
            }
        }
        Ok(())
    }

    /// Drop one reference to `blob_id`, queueing it for reclamation at zero.
    async fn release(
        &self,
        blob_id: &BlobId,
        conn: &mut DatabaseConnection,
        pending: &mut Vec<BlobId>,
    ) -> Result<()> {
        match Blob::decrement(blob_id, conn).await? {
            Some(count) if count <= 0 => pending.push(blob_id.clone()),
            Some(_) => {}
            None => warn!(blob_id = %blob_id, "file referenced a blob missing from the ledger"),
        }
        Ok(())
    }
}
