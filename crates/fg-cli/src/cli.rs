//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Focus guard.
///
/// Tracks time spent on allowlisted sites and runs focus sessions that block
/// everything else.
#[derive(Debug, Parser)]
#[command(name = "fg", version, about, long_about = None)]
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
    /// Run the browser host: JSON lines on stdin, replies and rule updates on stdout.
    Serve,

    /// Manage the allowlist.
    #[command(subcommand)]
    Allow(AllowAction),

    /// Start, stop or inspect focus sessions.
    #[command(subcommand)]
    Session(SessionAction),

    /// Show time spent per allowlisted domain.
    Stats {
        /// Day to report (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the current session and what is being timed.
    Status,

    /// Delete all recorded usage.
    Clear {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Allowlist actions.
#[derive(Debug, Subcommand)]
pub enum AllowAction {
    /// Add a domain (URLs and `www.` prefixes are accepted).
    Add {
        domain: String,
    },

    /// Remove a domain.
    Remove {
        domain: String,
    },

    /// List allowlisted domains.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Session actions.
#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Start blocking everything outside the allowlist.
    Start {
        /// Session length in minutes.
        #[arg(short, long)]
        minutes: Option<i64>,

        /// Refuse to stop the session early.
        #[arg(long)]
        strict: bool,
    },

    /// End the current session.
    Stop {
        /// Stop even a strict session.
        #[arg(long)]
        force: bool,
    },

    /// Show the current session.
    Show {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
