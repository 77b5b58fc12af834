use clap::Args;
use common::prelude::{FsError, OrphanCollector};

use crate::cli::display;
use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Gc {
    /// Also delete stored objects the blob ledger doesn't know about
    #[arg(long)]
    pub unindexed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GcError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("gc failed: {0}")]
    Fs(#[from] FsError),
}

impl Gc {
    pub async fn run(&self, collector: &OrphanCollector) -> Result<String, GcError> {
        let report = collector.sweep().await?;
        let mut out = display::sweep("orphaned blobs", &report);

        if self.unindexed {
            let report = collector.sweep_unindexed().await?;
            out.push('\n');
            out.push_str(&display::sweep("unindexed objects", &report));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Gc {
    type Error = GcError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, store) = ctx.store().await?;
        self.run(&store.orphan_collector()).await
    }
}
