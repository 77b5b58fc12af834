use std::io::Write;

use clap::{Args, Parser, Subcommand};
use common::prelude::FileSystem;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Cat, Cp, Gc, Info, Ls, Mkdir, Mv, Put, Rm, Rmdir, Stats};
use crate::cli::op::SessionError;

/// Interactive session that keeps a working directory between commands.
#[derive(Args, Debug, Clone)]
pub struct Shell;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: LineCommand,
}

#[derive(Subcommand, Debug)]
enum LineCommand {
    Ls(Ls),
    Mkdir(Mkdir),
    Rmdir(Rmdir),
    Put(Put),
    Cat(Cat),
    Rm(Rm),
    Cp(Cp),
    Mv(Mv),
    Info(Info),
    Gc(Gc),
    Stats(Stats),
    /// Change the working directory
    Cd {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print the working directory
    Pwd,
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

enum Flow {
    Continue(Option<String>),
    Exit,
}

impl Shell {
    async fn dispatch(fs: &mut FileSystem, command: LineCommand) -> anyhow::Result<Flow> {
        let output = match command {
            LineCommand::Ls(op) => op.run(fs).await?,
            LineCommand::Mkdir(op) => op.run(fs).await?,
            LineCommand::Rmdir(op) => op.run(fs).await?,
            LineCommand::Put(op) => {
                // the shell reads its commands from stdin
                if op.reads_stdin() {
                    anyhow::bail!("put cannot read stdin inside the shell; give a local file path");
                }
                op.run(fs).await?
            }
            LineCommand::Cat(op) => op.run(fs).await?,
            LineCommand::Rm(op) => op.run(fs).await?,
            LineCommand::Cp(op) => op.run(fs).await?,
            LineCommand::Mv(op) => op.run(fs).await?,
            LineCommand::Info(op) => op.run(fs).await?,
            LineCommand::Gc(op) => op.run(&fs.store().orphan_collector()).await?,
            LineCommand::Stats(op) => op.run(fs.store()).await?,
            LineCommand::Cd { path } => {
                fs.set_working_directory(&path).await?;
                return Ok(Flow::Continue(None));
            }
            LineCommand::Pwd => fs.working_directory().to_string(),
            LineCommand::Exit => return Ok(Flow::Exit),
        };
        Ok(Flow::Continue(Some(output)))
    }

    /// Run one input line against the session.
    async fn eval(fs: &mut FileSystem, line: &str) -> anyhow::Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Flow::Continue(None));
        }

        match Line::try_parse_from(words) {
            Ok(parsed) => Self::dispatch(fs, parsed.command).await,
            // help and usage errors are shown rather than treated as failures
            Err(e) => Ok(Flow::Continue(Some(e.render().to_string()))),
        }
    }

    fn prompt(fs: &FileSystem) {
        print!("{}:{}> ", fs.owner(), fs.working_directory());
        let _ = std::io::stdout().flush();
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Shell {
    type Error = ShellError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.session().await?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        Self::prompt(&fs);
        while let Some(line) = lines.next_line().await? {
            match Self::eval(&mut fs, &line).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue(Some(output))) => println!("{}", output.trim_end()),
                Ok(Flow::Continue(None)) => {}
                Err(e) => {
                    tracing::debug!("shell command failed: {:?}", e);
                    println!("Error: {}", e);
                }
            }
            Self::prompt(&fs);
        }

        Ok("bye".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn output(fs: &mut FileSystem, line: &str) -> Option<String> {
        match Shell::eval(fs, line).await.unwrap() {
            Flow::Continue(out) => out,
            Flow::Exit => None,
        }
    }

    #[tokio::test]
    async fn test_cd_and_relative_commands() {
        let store = common::prelude::Store::ephemeral().await.unwrap();
        let mut fs = store.session("alice").unwrap();

        output(&mut fs, "mkdir /docs/notes").await;
        assert_eq!(output(&mut fs, "cd /docs").await, None);
        assert_eq!(output(&mut fs, "pwd").await.unwrap(), "/docs");

        output(&mut fs, "mkdir drafts").await;
        let listing = output(&mut fs, "ls").await.unwrap();
        assert!(listing.contains("drafts/"));
        assert!(listing.contains("notes/"));
    }

    #[tokio::test]
    async fn test_errors_and_exit() {
        let store = common::prelude::Store::ephemeral().await.unwrap();
        let mut fs = store.session("alice").unwrap();

        assert!(Shell::eval(&mut fs, "cd /missing").await.is_err());
        assert_eq!(fs.working_directory(), "/");
        assert!(output(&mut fs, "bogus").await.is_some());
        assert!(matches!(
            Shell::eval(&mut fs, "quit").await.unwrap(),
            Flow::Exit
        ));
    }

    #[tokio::test]
    async fn test_put_from_stdin_is_rejected() {
        let store = common::prelude::Store::ephemeral().await.unwrap();
        let mut fs = store.session("alice").unwrap();

        assert!(Shell::eval(&mut fs, "put - /x.txt").await.is_err());
        assert!(fs.get_info("/x.txt").await.is_err());
    }
}
