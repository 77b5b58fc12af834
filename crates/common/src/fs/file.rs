use bytes::Bytes;
use object_store::BlobId;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{FileContent, FileSystem, FsError, Result};
use crate::database::DatabaseConnection;
use crate::hash::ContentHash;
use crate::model::{Blob, Node, NodeKind, NodeType};
use crate::path;

impl FileSystem {
    /// Write `content` to the file at `path`, creating it (and any missing
    /// parent directories) or replacing its content.
    pub async fn write_file(&self, path: &str, content: impl Into<Bytes>) -> Result<Node> {
        let path = self.resolve(path);
        let content_type = self.store.content_types.content_type(&path);
        let now = OffsetDateTime::now_utc();
        let mut pending = Vec::new();

        let mut tx = self.store.db.begin().await?;
        let node = self
            .write_file_in(&path, content.into(), content_type, now, &mut tx, &mut pending)
            .await?;
        tx.commit().await?;

        self.store.reclaim(pending).await;
        info!(owner = %self.owner, path = %node.path, size = node.size, "wrote file");
        Ok(node)
    }

    pub async fn read_file(&self, path: &str) -> Result<FileContent> {
        let path = self.resolve(path);
        let node = self.file_node(&path).await?;
        let blob_id = file_blob(&node)?;

        let bytes = self.store.storage.get(blob_id).await?;
        Ok(FileContent {
            bytes,
            content_type: node.content_type,
        })
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let path = self.resolve(path);
        let mut pending = Vec::new();

        let mut tx = self.store.db.begin().await?;
        let node = match Node::get(&self.owner, &path, &mut tx).await? {
            Some(node) if node.is_file() => node,
            _ => return Err(FsError::NotFound(path)),
        };
        Node::delete(&self.owner, &path, &mut tx).await?;
        self.release(file_blob(&node)?, &mut tx, &mut pending)
            .await?;
        tx.commit().await?;

        self.store.reclaim(pending).await;
        info!(owner = %self.owner, path = %path, "deleted file");
        Ok(())
    }

    /// Copy a file by reading it and writing the bytes to `to`. An existing
    /// file at `to` is overwritten.
    pub async fn copy_file(&self, from: &str, to: &str) -> Result<Node> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        if from == to {
            return Err(FsError::InvalidArgument(format!(
                "cannot copy '{}' onto itself",
                from
            )));
        }

        let content_type = self.store.content_types.content_type(&to);
        let now = OffsetDateTime::now_utc();
        let mut pending = Vec::new();

        let mut tx = self.store.db.begin().await?;
        let source = match Node::get(&self.owner, &from, &mut tx).await? {
            Some(node) if node.is_file() => node,
            _ => return Err(FsError::NotFound(from)),
        };
        let bytes = self.store.storage.get(file_blob(&source)?).await?;
        let node = self
            .write_file_in(&to, bytes, content_type, now, &mut tx, &mut pending)
            .await?;
        tx.commit().await?;

        self.store.reclaim(pending).await;
        info!(owner = %self.owner, from = %from, to = %to, "copied file");
        Ok(node)
    }

    /// Re-address a file. The blob is shared by the new node and no longer by
    /// the old one, so its reference count does not change.
    pub async fn move_file(&self, from: &str, to: &str) -> Result<Node> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        if from == to {
            return Err(FsError::InvalidArgument(format!(
                "cannot move '{}' onto itself",
                from
            )));
        }
        let now = OffsetDateTime::now_utc();

        let mut tx = self.store.db.begin().await?;
        let source = match Node::get(&self.owner, &from, &mut tx).await? {
            Some(node) if node.is_file() => node,
            _ => return Err(FsError::NotFound(from)),
        };
        if Node::exists(&self.owner, &to, &mut tx).await? {
            return Err(FsError::AlreadyExists(to));
        }
        self.ensure_parents(&to, now, &mut tx).await?;

        let moved = source.relocated(&to, now);
        moved.insert(&mut tx).await?;
        Node::delete(&self.owner, &from, &mut tx).await?;
        tx.commit().await?;

        info!(owner = %self.owner, from = %from, to = %to, "moved file");
        Ok(moved)
    }

    /// The write protocol, on a caller-supplied transaction.
    ///
    /// Blobs whose count drops to zero are appended to `pending`; the caller
    /// reclaims them once its transaction has committed.
    pub(super) async fn write_file_in(
        &self,
        path: &str,
        content: Bytes,
        content_type: String,
        now: OffsetDateTime,
        conn: &mut DatabaseConnection,
        pending: &mut Vec<BlobId>,
    ) -> Result<Node> {
        if path::is_root(path) {
            return Err(FsError::type_mismatch(path, NodeType::File));
        }

        let existing = Node::get(&self.owner, path, conn).await?;
        match &existing {
            Some(node) if node.is_dir() => {
                return Err(FsError::type_mismatch(path, NodeType::File));
            }
            Some(_) => {}
            None => self.ensure_parents(path, now, conn).await?,
        }

        let hash = ContentHash::compute(&content);
        let size = content.len() as u64;
        let current = existing.as_ref().and_then(Node::blob_id);

        let blob_id = match Blob::find_by_hash(&hash, conn).await? {
            // rewriting the same content keeps the reference we already hold
            Some(blob) if current == Some(&blob.blob_id) => blob.blob_id,
            Some(blob) if blob.is_orphaned() => {
                // a reclamation of the old id may be deleting its bytes right now
                let blob_id = BlobId::generate();
                self.store.storage.put(&blob_id, content).await?;
                if !Blob::revive(&blob.blob_id, &blob_id, conn).await? {
                    Blob::create(&blob_id, &hash, size, conn).await?;
                }
                debug!(
                    old_blob_id = %blob.blob_id,
                    blob_id = %blob_id,
                    hash = %hash,
                    "revived orphaned blob under a fresh id"
                );
                blob_id
            }
            Some(blob) => {
                Blob::increment(&blob.blob_id, conn).await?;
                debug!(blob_id = %blob.blob_id, hash = %hash, "dedup hit");
                blob.blob_id
            }
            None => {
                let blob_id = BlobId::generate();
                self.store.storage.put(&blob_id, content).await?;
                Blob::create(&blob_id, &hash, size, conn).await?;
                debug!(blob_id = %blob_id, hash = %hash, size, "dedup miss, stored new blob");
                blob_id
            }
        };

        match existing {
            Some(mut node) => {
                let previous = node.blob_id().cloned();
                node.kind = NodeKind::File {
                    blob_id: blob_id.clone(),
                };
                node.size = size;
                node.content_type = content_type;
                node.updated_at = now;
                node.update(conn).await?;

                if let Some(previous) = previous.filter(|id| *id != blob_id) {
                    self.release(&previous, conn, pending).await?;
                }
                Ok(node)
            }
            None => {
                let node = Node::file(&self.owner, path, blob_id, size, content_type, now);
                node.insert(conn).await?;
                Ok(node)
            }
        }
    }

    async fn file_node(&self, path: &str) -> Result<Node> {
        let mut conn = self.store.db.acquire().await?;
        match Node::get(&self.owner, path, &mut conn).await? {
            Some(node) if node.is_file() => Ok(node),
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }
}

fn file_blob(node: &Node) -> Result<&BlobId> {
    node.blob_id()
        .ok_or_else(|| FsError::type_mismatch(node.path.clone(), NodeType::File))
}

#[cfg(test)]
mod tests {
    use crate::fs::{ErrorKind, Store};

    #[tokio::test]
    async fn test_write_then_read() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();

        let node = fs.write_file("/notes/today.txt", "hello").await.unwrap();
        assert_eq!(node.size, 5);
        assert_eq!(node.content_type, "text/plain");
        assert!(fs.get_info("/notes").await.unwrap().is_dir());

        let content = fs.read_file("/notes/today.txt").await.unwrap();
        assert_eq!(content.as_text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();

        let first = fs.write_file("/f.txt", "one").await.unwrap();
        let second = fs.write_file("/f.txt", "two!").await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.size, 4);
        assert_ne!(second.blob_id(), first.blob_id());
        assert_eq!(fs.read_file("/f.txt").await.unwrap().bytes, "two!");

        // the first blob lost its only reference
        assert!(store.blob(first.blob_id().unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_over_directory_is_type_mismatch() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.create_directory("/docs").await.unwrap();

        let err = fs.write_file("/docs", "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        let err = fs.write_file("/", "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[tokio::test]
    async fn test_write_beneath_file_is_type_mismatch() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/a.txt", "x").await.unwrap();

        let err = fs.write_file("/a.txt/b.txt", "y").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(fs.get_info("/a.txt/b.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_read_and_delete_directory_as_file_is_not_found() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.create_directory("/d").await.unwrap();

        assert_eq!(
            fs.read_file("/d").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.delete_file("/d").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(fs.get_info("/d").await.is_ok());
    }

    #[tokio::test]
    async fn test_move_file_onto_existing_fails() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/a.txt", "a").await.unwrap();
        fs.write_file("/b.txt", "b").await.unwrap();

        let err = fs.move_file("/a.txt", "/b.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        let err = fs.move_file("/a.txt", "/a.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(fs.read_file("/a.txt").await.unwrap().bytes, "a");
    }

    #[tokio::test]
    async fn test_move_file_creates_parents_and_keeps_metadata() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        let original = fs.write_file("/a.txt", "a").await.unwrap();

        let moved = fs.move_file("a.txt", "deep/er/b.txt").await.unwrap();
        assert_eq!(moved.path, "/deep/er/b.txt");
        assert_eq!(moved.name, "b.txt");
        assert_eq!(moved.created_at, original.created_at);
        assert!(fs.get_info("/deep/er").await.unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_copy_file_overwrites_destination() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/a.txt", "alpha").await.unwrap();
        fs.write_file("/b.txt", "beta").await.unwrap();

        fs.copy_file("/a.txt", "/b.txt").await.unwrap();
        assert_eq!(fs.read_file("/b.txt").await.unwrap().bytes, "alpha");

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.blob_count, 1);
    }
}
