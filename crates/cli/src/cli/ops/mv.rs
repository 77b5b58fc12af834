use clap::Args;
use common::prelude::{FileSystem, FsError};

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Mv {
    /// File or directory to move
    pub from: String,
    /// Destination path; must not exist yet
    pub to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MvError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("mv failed: {0}")]
    Fs(#[from] FsError),
}

impl Mv {
    pub async fn run(&self, fs: &FileSystem) -> Result<String, MvError> {
        let source = fs.get_info(&self.from).await?;
        let node = if source.is_dir() {
            fs.move_directory(&source.path, &self.to).await?
        } else {
            fs.move_file(&source.path, &self.to).await?
        };
        Ok(format!("moved {} -> {}", source.path, node.path))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mv {
    type Error = MvError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let fs = ctx.session().await?;
        self.run(&fs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mv_dispatches_on_node_type() {
        let store = common::prelude::Store::ephemeral().await.unwrap();
        let fs = store.session("alice").unwrap();
        fs.write_file("/src/a.txt", "a").await.unwrap();
        fs.write_file("/b.txt", "b").await.unwrap();

        Mv {
            from: "/src".to_string(),
            to: "/dst".to_string(),
        }
        .run(&fs)
        .await
        .unwrap();
        Mv {
            from: "/b.txt".to_string(),
            to: "/dst/b.txt".to_string(),
        }
        .run(&fs)
        .await
        .unwrap();

        let names: Vec<_> = fs
            .list_directory("/dst")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
