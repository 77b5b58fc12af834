use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Directory to create; missing parents are created too
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MkdirError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("mkdir failed: {0}")]
    Fs(#[from] FsError),
}

impl Mkdir {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, MkdirError> {
        let node = fs.create_directory(&self.path).await?;
        Ok(format!("created {}", node.path))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mkdir {
    type Error = MkdirError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
