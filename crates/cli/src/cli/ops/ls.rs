use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::display;
use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Directory to list (defaults to the working directory)
    #[arg(default_value = ".")]
    pub path: String,

    /// Show content type and modification time
    #[arg(short, long)]
    pub long: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("ls failed: {0}")]
    Fs(#[from] FsError),
}

impl Ls {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, LsError> {
        let children = fs.list_directory(&self.path).await?;
        if children.is_empty() {
            return Ok(format!("{} is empty", fs.resolve(&self.path)));
        }
        Ok(display::listing(&children, self.long))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
