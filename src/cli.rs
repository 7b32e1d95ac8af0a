use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Triage workflow tasks: group, filter and select them for an agent chat.
/// Tasks are read from --tasks, or <data-dir>/tasks.json, or the built-in sample.
#[derive(Parser)]
#[command(name = "triage", version, about = "Workflow task triage CLI")]
pub struct Cli {
    /// Directory holding preferences and the default task file.
    #[arg(long, global = true, env = "TRIAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON file of task records (bare array or list response).
    #[arg(long, global = true, env = "TRIAGE_TASKS", conflicts_with = "sample")]
    pub tasks: Option<PathBuf>,

    /// Use the built-in sample task set.
    #[arg(long, global = true)]
    pub sample: bool,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}
