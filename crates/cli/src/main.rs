// CLI modules
mod cli;
mod logging;
mod state;

use clap::{Parser, Subcommand};
use cli::{
    args::Args, op::Op, Cat, Cp, Gc, Info, Init, Ls, Mkdir, Mv, Put, Rm, Rmdir, Shell, Stats,
    Version,
};
use tracing::level_filters::LevelFilter;

command_enum! {
    (Init, Init),
    (Mkdir, Mkdir),
    (Rmdir, Rmdir),
    (Ls, Ls),
    (Put, Put),
    (Cat, Cat),
    (Rm, Rm),
    (Cp, Cp),
    (Mv, Mv),
    (Info, Info),
    (Gc, Gc),
    (Stats, Stats),
    (Shell, Shell),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // logging follows the config when there is one; `init` runs before it exists
    let mut config_problem = None;
    let (level, log_dir) = match state::AppState::load(args.config_path.clone()) {
        Ok(state) => {
            let level = state.config.log_level_filter().unwrap_or_else(|e| {
                config_problem = Some(e);
                LevelFilter::WARN
            });
            (level, state.config.log_dir)
        }
        Err(_) => (LevelFilter::WARN, None),
    };
    let guards = logging::init_logging(level, log_dir.as_deref());
    if let Some(e) = config_problem {
        tracing::warn!("{}; logging at warn instead", e);
    }

    let ctx = cli::op::OpContext::new(args.config_path, args.owner, args.cwd);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writers before exiting
    drop(guards);
    std::process::exit(code);
}
