use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Local-first to-do list.
/// Storage defaults to ~/.taskify/tasks.json, $TASKIFY_HOME, or a path passed via --db.
#[derive(Parser)]
#[command(name = "taskify", version, about = "Local-first to-do list CLI and TUI")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to config.toml. Defaults to the data directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
