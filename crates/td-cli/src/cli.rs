//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use td_core::Timestamp;

use crate::commands::util::parse_timestamp_arg;

/// Smart task manager.
///
/// Reads a JSON snapshot of tasks, context and calendar commitments, then
/// reconciles priorities and deadlines or finds conflict-free time slots.
#[derive(Debug, Parser)]
#[command(name = "td", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file to read (defaults to stdin).
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Reference time, overriding the snapshot's `now` (RFC 3339).
    #[arg(long, global = true, value_parser = parse_timestamp_arg)]
    pub now: Option<Timestamp>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract dates from the snapshot's context.
    Extract,

    /// Reconcile the priority of `task`.
    Priority {
        /// Ask Claude for a suggestion first.
        #[arg(long)]
        ai: bool,
    },

    /// Reconcile the deadline of `task`.
    Deadline {
        /// Ask Claude for a suggestion first.
        #[arg(long)]
        ai: bool,
    },

    /// Find the earliest free slot for `task`.
    Slot {
        /// Do not start before this time (defaults to `now`).
        #[arg(long, value_parser = parse_timestamp_arg)]
        earliest: Option<Timestamp>,
    },

    /// Propose a placement for `task`, with alternatives.
    Suggest {
        /// Ask Claude for a slot first.
        #[arg(long)]
        ai: bool,
    },

    /// Place every task in `tasks` without overlaps.
    Schedule,

    /// Relevant context, priority, deadline and placement for `task`.
    Plan {
        /// Ask Claude for suggestions first.
        #[arg(long)]
        ai: bool,
    },

    /// Suggest categories and tags for `task`.
    Categorize {
        /// Ask Claude for suggestions first.
        #[arg(long)]
        ai: bool,
    },

    /// Summarize the load represented by `tasks`.
    Workload,
}
