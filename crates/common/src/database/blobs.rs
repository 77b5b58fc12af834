use object_store::BlobId;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use time::OffsetDateTime;

use super::DatabaseConnection;
use crate::hash::ContentHash;
use crate::model::Blob;

const BLOB_COLUMNS: &str = "blob_id, content_hash, size, reference_count, created_at";

/// Aggregate view of the reference-count ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobStats {
    pub blob_count: u64,
    pub total_bytes: u64,
    pub orphan_count: u64,
}

impl<'r> FromRow<'r, SqliteRow> for Blob {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let blob_id: String = row.try_get("blob_id")?;
        let hash_hex: String = row.try_get("content_hash")?;
        let content_hash = hash_hex
            .parse::<ContentHash>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let size: i64 = row.try_get("size")?;

        Ok(Blob {
            blob_id: BlobId::from(blob_id),
            content_hash,
            size: size.max(0) as u64,
            reference_count: row.try_get("reference_count")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl Blob {
    /// Record newly stored content with a single reference.
    pub(crate) async fn create(
        blob_id: &BlobId,
        content_hash: &ContentHash,
        size: u64,
        conn: &mut DatabaseConnection,
    ) -> Result<Blob, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO blobs (blob_id, content_hash, size, reference_count, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            "#,
        )
        .bind(blob_id.as_str())
        .bind(content_hash.to_hex())
        .bind(size as i64)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(Blob {
            blob_id: blob_id.clone(),
            content_hash: *content_hash,
            size,
            reference_count: 1,
            created_at: now,
        })
    }

    pub(crate) async fn find_by_hash(
        content_hash: &ContentHash,
        conn: &mut DatabaseConnection,
    ) -> Result<Option<Blob>, sqlx::Error> {
        let sql = format!("SELECT {} FROM blobs WHERE content_hash = ?1", BLOB_COLUMNS);
        sqlx::query_as::<_, Blob>(&sql)
            .bind(content_hash.to_hex())
            .fetch_optional(&mut *conn)
            .await
    }

    pub(crate) async fn get(
        blob_id: &BlobId,
        conn: &mut DatabaseConnection,
    ) -> Result<Option<Blob>, sqlx::Error> {
        let sql = format!("SELECT {} FROM blobs WHERE blob_id = ?1", BLOB_COLUMNS);
        sqlx::query_as::<_, Blob>(&sql)
            .bind(blob_id.as_str())
            .fetch_optional(&mut *conn)
            .await
    }

    /// Add one reference. Returns the new count, or `None` if the blob is unknown.
    pub(crate) async fn increment(
        blob_id: &BlobId,
        conn: &mut DatabaseConnection,
    ) -> Result<Option<i64>, sqlx::Error> {
        Self::adjust(blob_id, 1, conn).await
    }

    /// Drop one reference. Returns the new count, or `None` if the blob is unknown.
    pub(crate) async fn decrement(
        blob_id: &BlobId,
        conn: &mut DatabaseConnection,
    ) -> Result<Option<i64>, sqlx::Error> {
        Self::adjust(blob_id, -1, conn).await
    }

    async fn adjust(
        blob_id: &BlobId,
        delta: i64,
        conn: &mut DatabaseConnection,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE blobs SET reference_count = reference_count + ?2
            WHERE blob_id = ?1
            RETURNING reference_count
            "#,
        )
        .bind(blob_id.as_str())
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| r.try_get::<i64, _>("reference_count"))
            .transpose()
    }

    /// Move a pending-reclamation row onto `new_id` with a single live
    /// reference.
    ///
    /// The old id is left to whatever reclamation is already under way; it
    /// only ever deletes the old object and then finds no row to remove.
    /// Returns `false` if no orphaned row was found under `old_id`.
    pub(crate) async fn revive(
        old_id: &BlobId,
        new_id: &BlobId,
        conn: &mut DatabaseConnection,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE blobs SET blob_id = ?2, reference_count = 1
            WHERE blob_id = ?1 AND reference_count <= 0
            "#,
        )
        .bind(old_id.as_str())
        .bind(new_id.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every blob whose reference count is zero or below, oldest first.
    pub(crate) async fn orphans(conn: &mut DatabaseConnection) -> Result<Vec<Blob>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM blobs WHERE reference_count <= 0 ORDER BY created_at",
            BLOB_COLUMNS
        );
        sqlx::query_as::<_, Blob>(&sql).fetch_all(&mut *conn).await
    }

    /// Remove the ledger row, but only if the blob is still unreferenced.
    ///
    /// A concurrent write may have revived the blob between the caller's
    /// check and this delete; in that case nothing happens and `false` is
    /// returned.
    pub(crate) async fn delete_if_orphaned(
        blob_id: &BlobId,
        conn: &mut DatabaseConnection,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blobs WHERE blob_id = ?1 AND reference_count <= 0")
            .bind(blob_id.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn all(conn: &mut DatabaseConnection) -> Result<Vec<Blob>, sqlx::Error> {
        let sql = format!("SELECT {} FROM blobs ORDER BY created_at", BLOB_COLUMNS);
        sqlx::query_as::<_, Blob>(&sql).fetch_all(&mut *conn).await
    }

    pub(crate) async fn stats(conn: &mut DatabaseConnection) -> Result<BlobStats, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS blob_count,
                COALESCE(SUM(size), 0) AS total_bytes,
                COALESCE(SUM(CASE WHEN reference_count <= 0 THEN 1 ELSE 0 END), 0) AS orphan_count
            FROM blobs
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        let count = |column: &str| -> Result<u64, sqlx::Error> {
            Ok(row.try_get::<i64, _>(column)?.max(0) as u64)
        };

        Ok(BlobStats {
            blob_count: count("blob_count")?,
            total_bytes: count("total_bytes")?,
            orphan_count: count("orphan_count")?,
        })
    }
}
