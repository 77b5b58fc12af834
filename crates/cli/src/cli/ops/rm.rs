use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// File (or, with -r, directory) to delete
    pub path: String,

    /// Delete a directory and everything beneath it
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("rm failed: {0}")]
    Fs(#[from] FsError),
    #[error("{0} is a directory (use -r to delete it)")]
    IsDirectory(String),
}

impl Rm {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, RmError> {
        let node = fs.get_info(&self.path).await?;
        if node.is_dir() {
            if !self.recursive {
                return Err(RmError::IsDirectory(node.path));
            }
            fs.delete_directory(&node.path).await?;
        } else {
            fs.delete_file(&node.path).await?;
        }
        Ok(format!("removed {}", node.path))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
