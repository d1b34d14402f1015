use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::{HarvestedRecord, IdRange, Identifier, RunSummary};
use harvester_engine::{
    ensure_parent_dir, read_entries, CancellationToken, Harvester, LoadStatus, LogSink,
    ProgressLedger, ReqwestFetcher, ResultStore,
};

use crate::config::{HarvestConfig, RunPlan};

/// Exit status for a run abandoned by a second interrupt.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// The signal source went away; nothing more to watch.
    Closed,
    /// A second interrupt arrived while the run was still shutting down.
    ForceQuit,
}

/// First interrupt cancels `token`; a second one asks for an immediate exit.
async fn watch_interrupts<F, Fut>(token: CancellationToken, mut next_signal: F) -> Interrupt
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if next_signal().await.is_err() {
        return Interrupt::Closed;
    }
    engine_warn!("Interrupt received - saving results and stopping. Press Ctrl-C again to quit now.");
    token.cancel();
    match next_signal().await {
        Ok(()) => Interrupt::ForceQuit,
        Err(_) => Interrupt::Closed,
    }
}

pub async fn run(plan: RunPlan) -> Result<RunSummary> {
    ensure_parent_dir(&plan.output_path)
        .with_context(|| format!("cannot write results to {}", plan.output_path.display()))?;
    let fetcher = ReqwestFetcher::new(plan.fetch.clone()).context("failed to build HTTP client")?;
    let mut ledger = ProgressLedger::open(&plan.ledger_path)?;
    let (mut store, status) = ResultStore::load_with_status(&plan.output_path);
    if let LoadStatus::Corrupt { backup: None, .. } = status {
        engine_warn!(
            "Previous results in {:?} could not be preserved and will be overwritten.",
            plan.output_path
        );
    }

    engine_info!(
        "Harvesting {}..={} ({} identifiers); {} already in ledger, {} records loaded.",
        plan.range.start(),
        plan.range.end(),
        plan.range.len(),
        ledger.len(),
        store.len()
    );

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if watch_interrupts(signal_token, tokio::signal::ctrl_c).await == Interrupt::ForceQuit {
            engine_error!("Second interrupt - exiting without finishing the current write.");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });

    let harvester = Harvester::new(
        Arc::new(fetcher),
        plan.extractor,
        plan.locator,
        plan.harvest,
        Arc::new(LogSink),
    );
    let summary = harvester
        .run(plan.range, &mut ledger, &mut store, &token)
        .await?;
    Ok(summary)
}

/// How much of a range the ledger already covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    pub total: usize,
    pub completed: usize,
    pub next_pending: Option<Identifier>,
}

pub fn coverage(range: &IdRange, entries: &[String]) -> Coverage {
    let done: HashSet<&str> = entries.iter().map(String::as_str).collect();
    let mut completed = 0;
    let mut next_pending = None;
    for id in range.iter() {
        if done.contains(id.key().as_str()) {
            completed += 1;
        } else if next_pending.is_none() {
            next_pending = Some(id);
        }
    }
    Coverage {
        total: range.len(),
        completed,
        next_pending,
    }
}

/// Count records without touching the file, even when it is unreadable.
fn count_records(path: &Path) -> Result<Option<usize>> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("failed to read {}", path.display())),
    };
    let records: Vec<HarvestedRecord> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid result file", path.display()))?;
    Ok(Some(records.len()))
}

pub fn status(config: &HarvestConfig) -> Result<()> {
    let range = config.range()?;
    let entries = read_entries(&config.ledger_path);
    let cover = coverage(&range, &entries);

    println!("Ledger:  {} ({} entries)", config.ledger_path.display(), entries.len());
    match count_records(&config.output_path) {
        Ok(Some(count)) => println!("Results: {} ({} records)", config.output_path.display(), count),
        Ok(None) => println!("Results: {} (not written yet)", config.output_path.display()),
        Err(err) => println!("Results: {:#}", err),
    }
    println!(
        "Range:   {}..={}  {}/{} done",
        range.start(),
        range.end(),
        cover.completed,
        cover.total
    );
    match cover.next_pending {
        Some(id) => println!("Next:    {}", id),
        None => println!("Next:    range complete"),
    }
    Ok(())
}

pub fn forget(config: &HarvestConfig, raw_ids: &[String]) -> Result<usize> {
    let ids = raw_ids
        .iter()
        .map(|raw| Identifier::from_str(raw).with_context(|| format!("invalid identifier {raw:?}")))
        .collect::<Result<Vec<_>>>()?;
    let removed = ProgressLedger::forget(&config.ledger_path, &ids)?;
    engine_info!(
        "Removed {} of {} identifiers from {:?}.",
        removed,
        ids.len(),
        config.ledger_path
    );
    Ok(removed)
}
