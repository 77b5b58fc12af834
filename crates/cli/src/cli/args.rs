pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "A deduplicating, multi-tenant virtual filesystem")]
pub struct Args {
    /// Path to the strata config directory (defaults to ~/.strata)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Owner whose tree to operate on (defaults to the configured owner)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Working directory that relative paths resolve against
    #[arg(long, global = true)]
    pub cwd: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
