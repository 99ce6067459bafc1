//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Work session tracker.
///
/// Drives a planned work session through its activities and reports where
/// the time went.
#[derive(Debug, Parser)]
#[command(name = "ws", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a session script and print its summary.
    Replay {
        /// JSON script with the planned duration and a list of steps.
        script: PathBuf,

        /// Summarize as of this time instead of the last step.
        #[arg(long)]
        now: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize a recorded timeline.
    Summary(SummaryArgs),
}

/// Arguments for `ws summary`.
#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// JSON array of timeline entries.
    pub entries: PathBuf,

    /// Planned session length in seconds (defaults to the configured value).
    #[arg(long)]
    pub planned: Option<i64>,

    /// Seconds on the session timer (defaults to the span since the first entry).
    #[arg(long)]
    pub elapsed: Option<i64>,

    /// Reference time: epoch milliseconds, ISO 8601, or e.g. "5 minutes ago".
    #[arg(long)]
    pub now: Option<String>,

    /// The session timer ran out.
    #[arg(long)]
    pub time_up: bool,

    /// The session timer is still running.
    #[arg(long)]
    pub timer_active: bool,

    /// Every activity has been completed or removed.
    #[arg(long)]
    pub all_completed: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
