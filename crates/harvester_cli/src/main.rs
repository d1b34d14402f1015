mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use engine_logging::LogSettings;

use crate::config::{HarvestConfig, Overrides, RunOverrides};

#[derive(Parser)]
#[command(
    name = "harvester",
    about = "Resumable harvester for identifier-addressed prompt pages"
)]
struct Cli {
    /// RON config file (default: ./harvester.ron when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest the configured identifier range, resuming from the ledger
    Run(RunOverrides),
    /// Show ledger and result file progress
    Status,
    /// Remove identifiers from the ledger so the next run retries them
    Forget {
        /// Identifiers exactly as recorded, e.g. 007
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Resolve the configuration and logging settings shared by every command.
fn prepare(cli: &Cli) -> anyhow::Result<(HarvestConfig, LogSettings)> {
    let config = HarvestConfig::load(cli.config.as_deref())?.apply(&cli.overrides);
    let log = config.log_settings()?;
    Ok((config, log))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, log) = prepare(&cli)?;
    engine_logging::initialize(&log);

    match cli.command {
        Command::Run(run) => {
            let plan = config.apply_run(&run).plan()?;
            let summary = commands::run(plan).await?;
            if summary.interrupted {
                println!("Interrupted; rerun to resume.");
            }
            Ok(())
        }
        Command::Status => commands::status(&config),
        Command::Forget { ids } => {
            let removed = commands::forget(&config, &ids)?;
            println!("Removed {} ledger entries.", removed);
            Ok(())
        }
    }
}
