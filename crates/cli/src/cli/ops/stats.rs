use clap::Args;
use common::prelude::{FsError, Store};

use crate::cli::display;
use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Stats;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("stats failed: {0}")]
    Fs(#[from] FsError),
}

impl Stats {
    pub async fn run(&self, store: &Store) -> Result<String, StatsError> {
        let stats = store.stats().await?;
        Ok(display::stats(&stats))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Stats {
    type Error = StatsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, store) = ctx.store().await?;
        self.run(&store).await
    }
}
