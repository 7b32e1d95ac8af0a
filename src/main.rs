//! # triage - Workflow Task Triage CLI
//!
//! Command-line front end for the task triage core: load workflow tasks, list
//! them grouped under their ultimate parent with date, text, batch and state
//! filters, and turn a selection into a context block for an agent chat.
//!
//! ## Quick Start
//!
//! ```bash
//! # Groups from the built-in sample, newest first
//! triage --sample groups --children
//!
//! # Only one batch, created on a given day
//! triage --tasks tasks.json groups --batch "Early Morning DQ" --on 2025-09-01
//!
//! # Search tickers and other field values too
//! triage --sample groups --search cba --search-fields
//!
//! # Context block for a whole group plus one extra task
//! triage --sample context --group 2b888027-60e4-405e-82c6-bc0be9493e2e
//!
//! # Remember which chat endpoint to talk to
//! triage endpoint http://localhost:7777
//! ```
//!
//! Preferences live in `~/.triage/` (override with `--data-dir` or
//! `TRIAGE_DATA_DIR`). Logging goes to stderr; raise it with `-v` or `RUST_LOG`.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use task_triage::cli::Cli;
use task_triage::cmd::*;
use task_triage::config::default_data_dir;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("task_triage={level},triage={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let source = TaskSource::resolve(cli.tasks.clone(), cli.sample, &data_dir);

    let result = match cli.command {
        Commands::Groups { filter, children, limit } => cmd_groups(&source, &filter, children, limit),
        Commands::Context { groups, tasks, all_visible, filter } => {
            cmd_context(&source, &groups, &tasks, all_visible, &filter)
        }
        Commands::View { id } => cmd_view(&source, &id),
        Commands::States => cmd_states(&source),
        Commands::Batches => cmd_batches(&source),
        Commands::Endpoint { url } => cmd_endpoint(&data_dir, url),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
