use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::display;
use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Info {
    /// File or directory to describe
    #[arg(default_value = ".")]
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InfoError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("info failed: {0}")]
    Fs(#[from] FsError),
}

impl Info {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, InfoError> {
        let node = fs.get_info(&self.path).await?;
        Ok(display::info(&node))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Info {
    type Error = InfoError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
