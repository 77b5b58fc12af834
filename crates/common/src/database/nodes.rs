use object_store::BlobId;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use time::OffsetDateTime;

use super::DatabaseConnection;
use crate::model::{Node, NodeKind, NodeType, OwnerId};
use crate::path::{self, descendant_bounds};

const NODE_COLUMNS: &str =
    "owner_id, path, name, kind, size, content_type, blob_id, created_at, updated_at";

impl<'r> FromRow<'r, SqliteRow> for Node {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind_str: String = row.try_get("kind")?;
        let blob_id: Option<String> = row.try_get("blob_id")?;

        let kind = match (NodeType::parse(&kind_str), blob_id) {
            (Some(NodeType::Directory), _) => NodeKind::Directory,
            (Some(NodeType::File), Some(id)) => NodeKind::File {
                blob_id: BlobId::from(id),
            },
            (Some(NodeType::File), None) => {
                return Err(sqlx::Error::Decode("file node without a blob id".into()))
            }
            (None, _) => {
                return Err(sqlx::Error::Decode(
                    format!("unknown node kind '{}'", kind_str).into(),
                ))
            }
        };

        let size: i64 = row.try_get("size")?;
        let owner_id: String = row.try_get("owner_id")?;

        Ok(Node {
            name: row.try_get("name")?,
            path: row.try_get("path")?,
            size: size.max(0) as u64,
            content_type: row.try_get("content_type")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            owner_id: OwnerId::from(owner_id),
            kind,
        })
    }
}

impl Node {
    pub(crate) async fn insert(&self, conn: &mut DatabaseConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO nodes (
                owner_id, path, name, kind, size, content_type, blob_id,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(self.owner_id.as_str())
        .bind(&self.path)
        .bind(&self.name)
        .bind(self.node_type().as_str())
        .bind(self.size as i64)
        .bind(&self.content_type)
        .bind(self.blob_id().map(BlobId::as_str))
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Insert the owner's root directory unless it already exists.
    ///
    /// Returns `true` if the root was created by this call.
    pub(crate) async fn ensure_root(
        owner: &OwnerId,
        now: OffsetDateTime,
        conn: &mut DatabaseConnection,
    ) -> Result<bool, sqlx::Error> {
        let root = Node::directory(owner, path::ROOT, now);
        let result = sqlx::query(
            r#"
            INSERT INTO nodes (
                owner_id, path, name, kind, size, content_type, blob_id,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, 0, ?5, NULL, ?6, ?7)
            ON CONFLICT (owner_id, path) DO NOTHING
            "#,
        )
        .bind(owner.as_str())
        .bind(&root.path)
        .bind(&root.name)
        .bind(NodeType::Directory.as_str())
        .bind(&root.content_type)
        .bind(root.created_at)
        .bind(root.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn get(
        owner: &OwnerId,
        path: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<Option<Node>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM nodes WHERE owner_id = ?1 AND path = ?2",
            NODE_COLUMNS
        );
        sqlx::query_as::<_, Node>(&sql)
            .bind(owner.as_str())
            .bind(path)
            .fetch_optional(&mut *conn)
            .await
    }

    pub(crate) async fn exists(
        owner: &OwnerId,
        path: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM nodes WHERE owner_id = ?1 AND path = ?2")
            .bind(owner.as_str())
            .bind(path)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Persist this node's content fields (blob, size, type, mtime).
    pub(crate) async fn update(&self, conn: &mut DatabaseConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE nodes
            SET size = ?3, content_type = ?4, blob_id = ?5, updated_at = ?6
            WHERE owner_id = ?1 AND path = ?2
            "#,
        )
        .bind(self.owner_id.as_str())
        .bind(&self.path)
        .bind(self.size as i64)
        .bind(&self.content_type)
        .bind(self.blob_id().map(BlobId::as_str))
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub(crate) async fn delete(
        owner: &OwnerId,
        path: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM nodes WHERE owner_id = ?1 AND path = ?2")
            .bind(owner.as_str())
            .bind(path)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete `path` and every node beneath it.
    pub(crate) async fn delete_subtree(
        owner: &OwnerId,
        path: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<u64, sqlx::Error> {
        let (lo, hi) = descendant_bounds(path);
        let result = sqlx::query(
            r#"
            DELETE FROM nodes
            WHERE owner_id = ?1 AND (path = ?2 OR (path >= ?3 AND path < ?4))
            "#,
        )
        .bind(owner.as_str())
        .bind(path)
        .bind(lo)
        .bind(hi)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Every strict descendant of `path`, parents before children.
    pub(crate) async fn descendants(
        owner: &OwnerId,
        path: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<Vec<Node>, sqlx::Error> {
        let (lo, hi) = descendant_bounds(path);
        let sql = format!(
            r#"
            SELECT {} FROM nodes
            WHERE owner_id = ?1 AND path >= ?2 AND path < ?3 AND path <> ?4
            ORDER BY path
            "#,
            NODE_COLUMNS
        );
        sqlx::query_as::<_, Node>(&sql)
            .bind(owner.as_str())
            .bind(lo)
            .bind(hi)
            .bind(path)
            .fetch_all(&mut *conn)
            .await
    }

    /// Immediate children of `path`, sorted by name.
    pub(crate) async fn children(
        owner: &OwnerId,
        path: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<Vec<Node>, sqlx::Error> {
        let (lo, hi) = descendant_bounds(path);
        // a child has no separator after the directory prefix
        let sql = format!(
            r#"
            SELECT {} FROM nodes
            WHERE owner_id = ?1 AND path >= ?2 AND path < ?3 AND path <> ?4
              AND instr(substr(path, length(?2) + 1), '/') = 0
            ORDER BY name
            "#,
            NODE_COLUMNS
        );
        sqlx::query_as::<_, Node>(&sql)
            .bind(owner.as_str())
            .bind(lo)
            .bind(hi)
            .bind(path)
            .fetch_all(&mut *conn)
            .await
    }
}
