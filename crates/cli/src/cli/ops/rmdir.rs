use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Rmdir {
    /// Directory to delete, along with everything beneath it
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RmdirError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("rmdir failed: {0}")]
    Fs(#[from] FsError),
}

impl Rmdir {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, RmdirError> {
        let path = fs.resolve(&self.path);
        fs.delete_directory(&path).await?;
        Ok(format!("removed {}", path))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rmdir {
    type Error = RmdirError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
