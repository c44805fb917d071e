//! # Taskify CLI
//!
//! ## Key Commands
//!
//! - `taskify ui` - Launch the tabbed TUI (Home / Finished / Info)
//! - `taskify add <title> --desc <text> --course <tag> [--due <when>]` - Create a task
//! - `taskify list [--all]` - Tasks still to do
//! - `taskify finished` - Finished tasks grouped into Bills, Food, Meetings, Medication, Other
//! - `taskify view|edit|done|reopen|delete <id>` - Act on one task
//!
//! Set `RUST_LOG=debug` for store and controller tracing. In the TUI, logs go to
//! `taskify.log` in the data directory.

use clap::Parser;

use taskify::cli::Cli;
use taskify::cmd::*;
use taskify::config::Config;
use taskify::logging;

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.db.clone(), cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    match &cli.command {
        Commands::Ui => {
            if let Err(e) = logging::setup_file(&config.log_path()) {
                eprintln!("Failed to open log file {}: {e}", config.log_path().display());
                std::process::exit(1);
            }
        }
        _ => logging::setup_stderr(),
    }

    // Commands that don't touch the database.
    match cli.command {
        Commands::Completions { shell } => {
            cmd_completions(shell);
            return;
        }
        Commands::Info => {
            cmd_info(&config);
            return;
        }
        _ => {}
    }

    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open {}: {e}", config.db_path.display());
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Ui => cmd_ui(&config, &store),
        Commands::Add { title, desc, course, due } => cmd_add(&store, title, desc, course, due),
        Commands::List { all } => cmd_list(&store, all),
        Commands::Finished => cmd_finished(&config, &store),
        Commands::View { id } => cmd_view(&config, &store, id),
        Commands::Edit { id, title, desc, course, due } => {
            cmd_edit(&store, id, title, desc, course, due)
        }
        Commands::Done { id } => cmd_set_finished(&store, id, true),
        Commands::Reopen { id } => cmd_set_finished(&store, id, false),
        Commands::Delete { id } => cmd_delete(&store, id),
        Commands::Info | Commands::Completions { .. } => unreachable!("handled above"),
    }
}
