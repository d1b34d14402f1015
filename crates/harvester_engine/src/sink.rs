use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::HarvestEvent;

/// Context object receiving every per-identifier event of a run.
pub trait HarvestSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Forwards events to the process logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl HarvestSink for LogSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::Skipped { id } => {
                engine_debug!("[{}] Already in ledger - skipping.", id);
            }
            HarvestEvent::Fetching {
                id,
                position,
                total,
            } => {
                engine_info!("[{}] Fetching... ({}/{})", id, position, total);
            }
            HarvestEvent::Retrying {
                id,
                attempt,
                max_attempts,
                cause,
                delay,
            } => {
                engine_warn!(
                    "[{}] {} (attempt {}/{}), retrying in {:.1}s",
                    id,
                    cause,
                    attempt,
                    max_attempts,
                    delay.as_secs_f64()
                );
            }
            HarvestEvent::Redirected { id, to } => {
                engine_info!("[{}] Redirected to {}", id, to);
            }
            HarvestEvent::NotFound { id } => {
                engine_info!("[{}] 404 Not Found - skipping.", id);
            }
            HarvestEvent::FetchFailed {
                id,
                attempts,
                cause,
            } => {
                engine_error!("[{}] Giving up after {} attempt(s): {}", id, attempts, cause);
            }
            HarvestEvent::Extracted {
                id,
                strategy,
                body_chars,
            } => {
                engine_debug!("[{}] Extracted via {} ({} chars)", id, strategy, body_chars);
            }
            HarvestEvent::ExtractionFailed { id, reason } => {
                engine_warn!("[{}] {} - skipping.", id, reason);
            }
            HarvestEvent::Duplicate { id } => {
                engine_info!("[{}] Already in results - not appended.", id);
            }
            HarvestEvent::Checkpoint { records, path } => {
                engine_info!("  >> Checkpoint saved ({} total records) to {:?}", records, path);
            }
            HarvestEvent::Finished {
                summary,
                records,
                path,
            } => {
                engine_info!("{}", "=".repeat(60));
                if summary.interrupted {
                    engine_info!("Crawl interrupted - rerun to resume.");
                } else {
                    engine_info!("Crawl complete!");
                }
                engine_info!("  Total processed  : {}", summary.processed);
                engine_info!("  Skipped (resume) : {}", summary.skipped);
                engine_info!("  Fetched          : {}", summary.fetched);
                engine_info!("  Not found        : {}", summary.not_found);
                engine_info!("  Extraction failed: {}", summary.extraction_failed);
                engine_info!("  Duplicates       : {}", summary.duplicates);
                engine_info!("  Errors           : {}", summary.errored);
                engine_info!("  Total in JSON    : {}", records);
                engine_info!("  Output           : {:?}", path);
                engine_info!("{}", "=".repeat(60));
            }
        }
    }
}
