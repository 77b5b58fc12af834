use clap::Args;
use common::prelude::{FsError, Store};

use crate::state::{AppConfig, AppState, BlobStoreConfig, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Owner used when commands don't pass --owner
    #[arg(long, default_value = "default")]
    pub default_owner: String,

    /// Default log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Directory for rolling log files
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,

    /// Keep blob bytes somewhere other than <config dir>/blobs
    #[arg(long)]
    pub blobs_path: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("failed to create database: {0}")]
    Store(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            default_owner: self.default_owner.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            blob_store: BlobStoreConfig::Filesystem {
                path: self.blobs_path.clone(),
            },
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        // create the schema up front
        let store = Store::open(&state.db_path, state.object_store_config()).await?;
        store.database().close().await;

        let output = format!(
            "Initialized strata directory at: {}\n\
             - Database: {}\n\
             - Blobs: {}\n\
             - Config: {}\n\
             - Default owner: {}",
            state.strata_dir.display(),
            state.db_path.display(),
            self.blobs_path
                .as_ref()
                .unwrap_or(&state.blobs_path)
                .display(),
            state.config_path.display(),
            state.config.default_owner,
        );

        Ok(output)
    }
}
