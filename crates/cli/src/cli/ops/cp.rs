use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Cp {
    /// File or directory to copy
    pub from: String,
    /// Destination path
    pub to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CpError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cp failed: {0}")]
    Fs(#[from] FsError),
}

impl Cp {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, CpError> {
        let source = fs.get_info(&self.from).await?;
        let node = if source.is_dir() {
            fs.copy_directory(&source.path, &self.to).await?
        } else {
            fs.copy_file(&source.path, &self.to).await?
        };
        Ok(format!("copied {} -> {}", source.path, node.path))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cp {
    type Error = CpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
