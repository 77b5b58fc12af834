use std::path::PathBuf;

use clap::Args;
use common::prelude::{FileSystem, FsError};
use tokio::io::AsyncReadExt;

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Local file to upload, or `-` for stdin
    pub source: PathBuf,

    /// Destination path (defaults to the source file name in the working directory)
    pub dest: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("put failed: {0}")]
    Fs(#[from] FsError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("a destination path is required when reading from stdin")]
    NoDestination,
}

impl Put {
    fn destination(&self) -> Result<String, PutError> {
        if let Some(dest) = &self.dest {
            return Ok(dest.clone());
        }
        if self.reads_stdin() {
            return Err(PutError::NoDestination);
        }
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(PutError::NoDestination)
    }

    pub fn reads_stdin(&self) -> bool {
        self.source.as_os_str() == "-"
    }

    async fn read_source(&self) -> Result<Vec<u8>, PutError> {
        let read_err = |source| PutError::Read {
            path: self.source.clone(),
            source,
        };

        if self.reads_stdin() {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .map_err(read_err)?;
            Ok(buf)
        } else {
            tokio::fs::read(&self.source).await.map_err(read_err)
        }
    }

    pub async fn run(&self, fs: &FileSystem) -> Result<String, PutError> {
        let dest = self.destination()?;
        let content = self.read_source().await?;
        let node = fs.write_file(&dest, content).await?;
        Ok(format!(
            "wrote {} ({} bytes, {})",
            node.path, node.size, node.content_type
        ))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}
