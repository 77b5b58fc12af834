use std::path::PathBuf;

use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::display;
use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// File to read
    pub path: String,

    /// Write the content to a local file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cat failed: {0}")]
    Fs(#[from] FsError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Cat {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, CatError> {
        let path = fs.resolve(&self.path);
        let content = fs.read_file(&path).await?;

        match &self.output {
            Some(output) => {
                tokio::fs::write(output, &content.bytes)
                    .await
                    .map_err(|source| CatError::Write {
                        path: output.clone(),
                        source,
                    })?;
                Ok(format!(
                    "wrote {} bytes to {}",
                    content.bytes.len(),
                    output.display()
                ))
            }
            None => Ok(display::content(&path, &content)),
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cat {
    type Error = CatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
