use time::OffsetDateTime;
use tracing::{debug, info};

use super::{FileSystem, FsError, Result};
use crate::database::DatabaseConnection;
use crate::model::Node;
use crate::path;

impl FileSystem {
    pub async fn create_directory(&self, path: &str) -> Result<Node> {
        let path = self.resolve(path);
        let now = OffsetDateTime::now_utc();

        let mut tx = self.store.db.begin().await?;
        let node = if path::is_root(&path) {
            if !Node::ensure_root(&self.owner, now, &mut tx).await? {
                return Err(FsError::AlreadyExists(path));
            }
            Node::directory(&self.owner, &path, now)
        } else {
            if Node::exists(&self.owner, &path, &mut tx).await? {
                return Err(FsError::AlreadyExists(path));
            }
            self.ensure_parents(&path, now, &mut tx).await?;
            let node = Node::directory(&self.owner, &path, now);
            node.insert(&mut tx).await?;
            node
        };
        tx.commit().await?;

        info!(owner = %self.owner, path = %node.path, "created directory");
        Ok(node)
    }

    /// Delete a directory and everything beneath it.
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let path = self.resolve(path);
        let mut pending = Vec::new();

        let mut tx = self.store.db.begin().await?;
        self.directory_node(&path, &mut tx).await?;

        let descendants = Node::descendants(&self.owner, &path, &mut tx).await?;
        let removed = Node::delete_subtree(&self.owner, &path, &mut tx).await?;
        for blob_id in descendants.iter().filter_map(Node::blob_id) {
            self.release(blob_id, &mut tx, &mut pending).await?;
        }
        tx.commit().await?;

        let files = descendants.iter().filter(|n| n.is_file()).count();
        self.store.reclaim(pending).await;
        info!(owner = %self.owner, path = %path, removed, files, "deleted directory");
        Ok(())
    }

    /// Recreate the subtree at `from` under `to`. Files go through the write
    /// protocol, so every copy takes its own reference on the shared blob.
    pub async fn copy_directory(&self, from: &str, to: &str) -> Result<Node> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        check_not_nested(&from, &to)?;
        let now = OffsetDateTime::now_utc();
        let mut pending = Vec::new();

        let mut tx = self.store.db.begin().await?;
        self.directory_node(&from, &mut tx).await?;
        let root = self.create_destination(&to, None, now, &mut tx).await?;

        let descendants = Node::descendants(&self.owner, &from, &mut tx).await?;
        for node in &descendants {
            let Some(target) = path::rebase(&node.path, &from, &to) else {
                continue;
            };
            match node.blob_id() {
                None => {
                    debug!(owner = %self.owner, path = %target, "copying directory");
                    Node::directory(&self.owner, &target, now)
                        .insert(&mut tx)
                        .await?;
                }
                Some(blob_id) => {
                    debug!(owner = %self.owner, path = %target, "copying file");
                    let content = self.store.storage.get(blob_id).await?;
                    let content_type = self.store.content_types.content_type(&target);
                    self.write_file_in(&target, content, content_type, now, &mut tx, &mut pending)
                        .await?;
                }
            }
        }
        tx.commit().await?;

        self.store.reclaim(pending).await;
        info!(
            owner = %self.owner,
            from = %from,
            to = %to,
            nodes = descendants.len(),
            "copied directory"
        );
        Ok(root)
    }

    /// Re-address the subtree at `from` under `to`. Only paths change;
    /// reference counts are untouched.
    pub async fn move_directory(&self, from: &str, to: &str) -> Result<Node> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        check_not_nested(&from, &to)?;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.store.db.begin().await?;
        let source = self.directory_node(&from, &mut tx).await?;
        let root = self.create_destination(&to, Some(&source), now, &mut tx).await?;

        let descendants = Node::descendants(&self.owner, &from, &mut tx).await?;
        for node in &descendants {
            let Some(target) = path::rebase(&node.path, &from, &to) else {
                continue;
            };
            debug!(owner = %self.owner, from = %node.path, to = %target, "moving node");
            node.relocated(&target, now).insert(&mut tx).await?;
        }
        Node::delete_subtree(&self.owner, &from, &mut tx).await?;
        tx.commit().await?;

        info!(
            owner = %self.owner,
            from = %from,
            to = %to,
            nodes = descendants.len(),
            "moved directory"
        );
        Ok(root)
    }

    /// Immediate children of a directory, sorted by name.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<Node>> {
        let path = self.resolve(path);
        match self.lookup(&path).await? {
            Some(node) if node.is_dir() => {}
            _ => return Err(FsError::NotFound(path)),
        }

        let mut conn = self.store.db.acquire().await?;
        Ok(Node::children(&self.owner, &path, &mut conn).await?)
    }

    async fn directory_node(&self, path: &str, conn: &mut DatabaseConnection) -> Result<Node> {
        match Node::get(&self.owner, path, conn).await? {
            Some(node) if node.is_dir() => Ok(node),
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// Insert the top directory of a copy or move, failing if `to` is taken.
    ///
    /// A moved directory keeps its original creation time.
    async fn create_destination(
        &self,
        to: &str,
        source: Option<&Node>,
        now: OffsetDateTime,
        conn: &mut DatabaseConnection,
    ) -> Result<Node> {
        if Node::exists(&self.owner, to, conn).await? {
            return Err(FsError::AlreadyExists(to.to_string()));
        }
        self.ensure_parents(to, now, conn).await?;

        let node = match source {
            Some(source) => source.relocated(to, now),
            None => Node::directory(&self.owner, to, now),
        };
        if path::is_root(to) {
            Node::ensure_root(&self.owner, now, conn).await?;
        } else {
            node.insert(conn).await?;
        }
        Ok(node)
    }
}

/// A directory can't be copied or moved onto itself or into its own subtree.
fn check_not_nested(from: &str, to: &str) -> Result<()> {
    if from == to || path::is_ancestor(from, to) {
        return Err(FsError::move_into_self(from, to));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::fs::{ErrorKind, Store};

    #[tokio::test]
    async fn test_create_directory_fills_parents() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();

        fs.create_directory("/a/b/c").await.unwrap();
        for p in ["/", "/a", "/a/b", "/a/b/c"] {
            assert!(fs.get_info(p).await.unwrap().is_dir(), "{} missing", p);
        }

        let err = fs.create_directory("/a/b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        let err = fs.create_directory("/").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_root_on_fresh_owner() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();

        let root = fs.create_directory("/").await.unwrap();
        assert_eq!(root.path, "/");
        assert!(fs.list_directory("/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_directory_under_file_fails() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/f.txt", "x").await.unwrap();

        let err = fs.create_directory("/f.txt/sub").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[tokio::test]
    async fn test_list_directory_immediate_children() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/docs/b.txt", "b").await.unwrap();
        fs.write_file("/docs/a.txt", "a").await.unwrap();
        fs.write_file("/docs/sub/deep.txt", "d").await.unwrap();
        fs.write_file("/docs-old/x.txt", "x").await.unwrap();

        let names: Vec<_> = fs
            .list_directory("/docs")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);

        let err = fs.list_directory("/docs/a.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = fs.list_directory("/missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_root_on_fresh_owner() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        assert!(fs.list_directory("/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_directory_relocates_subtree() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/src/a.txt", "a").await.unwrap();
        fs.write_file("/src/nested/b.txt", "b").await.unwrap();

        let moved = fs.move_directory("/src", "/archive/dst").await.unwrap();
        assert_eq!(moved.path, "/archive/dst");
        assert_eq!(moved.name, "dst");

        assert_eq!(
            fs.read_file("/archive/dst/nested/b.txt").await.unwrap().bytes,
            "b"
        );
        assert_eq!(
            fs.get_info("/src").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.get_info("/src/nested/b.txt").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_move_and_copy_onto_existing_fail() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.create_directory("/a").await.unwrap();
        fs.create_directory("/b").await.unwrap();

        for result in [
            fs.move_directory("/a", "/b").await,
            fs.copy_directory("/a", "/b").await,
        ] {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadyExists);
        }
    }

    #[tokio::test]
    async fn test_copy_directory_of_file_is_not_found() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/f.txt", "x").await.unwrap();

        let err = fs.copy_directory("/f.txt", "/g").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = fs.delete_directory("/f.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_root_clears_owner() {
        let store = Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/a/b.txt", "b").await.unwrap();

        fs.delete_directory("/").await.unwrap();
        assert!(fs.list_directory("/").await.unwrap().is_empty());
        assert_eq!(store.stats().await.unwrap().blob_count, 0);
    }
}
