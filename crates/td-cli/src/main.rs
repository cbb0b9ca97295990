use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use td_core::{StaticSuggestions, Timestamp};
use tracing_subscriber::EnvFilter;

use td_cli::commands::ai::{Advisor, Need};
use td_cli::commands::input::Snapshot;
use td_cli::commands::util::local_now;
use td_cli::commands::{
    categorize, deadline, extract, plan, priority, schedule, slot, suggest, workload,
};
use td_cli::{Cli, Commands, Config};

/// Suggestions for `task`: fetched from Claude with `--ai`, otherwise the
/// snapshot's own payloads.
fn suggestions(
    ai: bool,
    needs: &[Need],
    config: &Config,
    snapshot: &Snapshot,
    now: Timestamp,
    relevant_only: bool,
) -> Result<StaticSuggestions> {
    if !ai {
        return Ok(snapshot.suggestion.clone());
    }
    let task = snapshot.require_task()?;
    let advisor = Advisor::from_config(config)?;
    let context = if relevant_only {
        plan::relevant_context(task, snapshot, now, &config.context)
            .into_iter()
            .map(|scored| scored.item)
            .collect()
    } else {
        snapshot.context.clone()
    };
    advisor.fetch(needs, snapshot, &context, now, &config.lexicon)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let snapshot = Snapshot::read(cli.input.as_deref())?;
    let now = snapshot.resolve_now(cli.now, local_now);
    tracing::debug!(%now, "reference time");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Extract => extract::run(&mut out, &snapshot, now, &config.lexicon)?,
        Commands::Priority { ai } => {
            let provider = suggestions(*ai, &[Need::Priority], &config, &snapshot, now, false)?;
            priority::run(&mut out, &snapshot, &provider, now, &config.lexicon)?;
        }
        Commands::Deadline { ai } => {
            let provider = suggestions(*ai, &[Need::Deadline], &config, &snapshot, now, false)?;
            deadline::run(&mut out, &snapshot, &provider, now, &config.lexicon)?;
        }
        Commands::Slot { earliest } => {
            slot::run(&mut out, &snapshot, *earliest, &config.slot_config()?, now)?;
        }
        Commands::Suggest { ai } => {
            let provider = suggestions(*ai, &[Need::Schedule], &config, &snapshot, now, false)?;
            suggest::run(&mut out, &snapshot, &provider, &config.slot_config()?, now)?;
        }
        Commands::Schedule => schedule::run(&mut out, &snapshot, &config.slot_config()?, now)?,
        Commands::Plan { ai } => {
            let needs = [Need::Priority, Need::Deadline, Need::Schedule];
            let provider = suggestions(*ai, &needs, &config, &snapshot, now, true)?;
            plan::run(&mut out, &snapshot, &provider, &config, now)?;
        }
        Commands::Categorize { ai } => {
            let provider = suggestions(*ai, &[Need::Categorize], &config, &snapshot, now, false)?;
            categorize::run(&mut out, &snapshot, &provider)?;
        }
        Commands::Workload => workload::run(&mut out, &snapshot, now)?,
    }

    out.flush()?;
    Ok(())
}
