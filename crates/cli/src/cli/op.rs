use std::error::Error;
use std::path::PathBuf;

use common::prelude::{FileSystem, FsError, Store};

use crate::state::{AppState, StateError};

#[derive(Clone, Debug)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.strata)
    pub config_path: Option<PathBuf>,
    /// Owner override; falls back to the configured default owner
    pub owner: Option<String>,
    /// Working directory to start the session in
    pub cwd: Option<String>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, owner: Option<String>, cwd: Option<String>) -> Self {
        Self {
            config_path,
            owner,
            cwd,
        }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    /// Open the store described by the loaded config.
    pub async fn store(&self) -> Result<(AppState, Store), SessionError> {
        let state = self.state()?;
        let store = Store::open(&state.db_path, state.object_store_config()).await?;
        Ok((state, store))
    }

    /// Open a session for the selected owner, positioned at `--cwd` if given.
    pub async fn session(&self) -> Result<FileSystem, SessionError> {
        let (state, store) = self.store().await?;
        let owner = self
            .owner
            .clone()
            .unwrap_or_else(|| state.config.default_owner.clone());

        let mut fs = store.session(owner)?;
        if let Some(cwd) = &self.cwd {
            fs.set_working_directory(cwd).await?;
        }
        Ok(fs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
