//! Reclamation of unreferenced blobs.

use std::collections::HashSet;
use std::sync::Arc;

use object_store::{BlobId, BlobStorage};
use tracing::{info, warn};

use super::Result;
use crate::database::Database;
use crate::model::Blob;

/// Outcome of a sweep. Blobs that failed stay where they were and are
/// retried by the next sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reclaimed: Vec<BlobId>,
    pub failed: Vec<BlobId>,
}

/// Best-effort backstop for blobs that a failed reclamation left behind.
#[derive(Debug, Clone)]
pub struct OrphanCollector {
    db: Database,
    storage: Arc<dyn BlobStorage>,
}

impl OrphanCollector {
    pub(crate) fn new(db: Database, storage: Arc<dyn BlobStorage>) -> Self {
        Self { db, storage }
    }

    /// Reclaim every blob whose reference count is zero or below.
    ///
    /// Each blob is handled on its own; a failure is logged and the sweep
    /// moves on.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let orphans = {
            let mut conn = self.db.acquire().await?;
            Blob::orphans(&mut conn).await?
        };

        let mut report = SweepReport::default();
        for blob in orphans {
            match reclaim_blob(&self.db, self.storage.as_ref(), &blob.blob_id).await {
                Ok(true) => report.reclaimed.push(blob.blob_id),
                Ok(false) => {}
                Err(e) => {
                    warn!(blob_id = %blob.blob_id, error = %e, "failed to reclaim orphaned blob");
                    report.failed.push(blob.blob_id);
                }
            }
        }

        info!(
            reclaimed = report.reclaimed.len(),
            failed = report.failed.len(),
            "orphan sweep finished"
        );
        Ok(report)
    }

    /// Delete stored objects that have no ledger entry at all.
    ///
    /// These are left behind when a write stores bytes and its transaction
    /// then rolls back. A write in flight has the same shape, so this must
    /// only run while nothing else is writing to the store.
    pub async fn sweep_unindexed(&self) -> Result<SweepReport> {
        let stored = self.storage.list().await?;
        let known: HashSet<BlobId> = {
            let mut conn = self.db.acquire().await?;
            Blob::all(&mut conn)
                .await?
                .into_iter()
                .map(|blob| blob.blob_id)
                .collect()
        };

        let mut report = SweepReport::default();
        for blob_id in stored.into_iter().filter(|id| !known.contains(id)) {
            match self.storage.delete(&blob_id).await {
                Ok(()) => report.reclaimed.push(blob_id),
                Err(e) => {
                    warn!(blob_id = %blob_id, error = %e, "failed to delete unindexed object");
                    report.failed.push(blob_id);
                }
            }
        }

        info!(
            reclaimed = report.reclaimed.len(),
            failed = report.failed.len(),
            "unindexed sweep finished"
        );
        Ok(report)
    }
}

/// Delete a blob's bytes and then its ledger row, provided it is still
/// unreferenced. Returns `false` if there was no row to reclaim.
///
/// The connection is not held across the physical delete. A row that has
/// vanished was revived under a fresh id (or reclaimed by someone else), and
/// no node references the old id any more, so its bytes are deleted anyway.
pub(super) async fn reclaim_blob(
    db: &Database,
    storage: &dyn BlobStorage,
    blob_id: &BlobId,
) -> Result<bool> {
    let blob = {
        let mut conn = db.acquire().await?;
        Blob::get(blob_id, &mut conn).await?
    };
    match blob {
        Some(blob) if blob.is_orphaned() => {}
        Some(_) => return Ok(false),
        None => {
            storage.delete(blob_id).await?;
            return Ok(false);
        }
    }

    storage.delete(blob_id).await?;
    let mut conn = db.acquire().await?;
    Ok(Blob::delete_if_orphaned(blob_id, &mut conn).await?)
}
