use std::sync::Arc;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use harvester_core::{
    update, Effect, IdRange, Identifier, Msg, PageOutcome, PageResult, RetryPolicy, RunSettings,
    RunState, RunSummary, SourceLocator,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ledger::{LedgerError, ProgressLedger};
use crate::persist::PersistError;
use crate::retry::{fetch_page, FetchReport};
use crate::store::ResultStore;
use crate::{Fetcher, HarvestEvent, HarvestSink, RecordExtractor};

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Politeness delay after every fetched identifier.
    pub delay: Duration,
    pub retry: RetryPolicy,
    pub run: RunSettings,
    /// Encoding applied to every page regardless of what it declares.
    pub encoding: &'static Encoding,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
            run: RunSettings::default(),
            encoding: UTF_8,
        }
    }
}

/// Failures that abort a run: the ledger or the result file could not be written.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("failed to write results: {0}")]
    Store(#[from] PersistError),
}

/// Sequential harvester: walks an [`IdRange`] in order, one identifier at a
/// time, and executes the effects produced by [`harvester_core::update`].
pub struct Harvester {
    fetcher: Arc<dyn Fetcher>,
    extractor: RecordExtractor,
    locator: SourceLocator,
    settings: HarvestSettings,
    sink: Arc<dyn HarvestSink>,
}

impl Harvester {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: RecordExtractor,
        locator: SourceLocator,
        settings: HarvestSettings,
        sink: Arc<dyn HarvestSink>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            locator,
            settings,
            sink,
        }
    }

    /// Harvest `range`, skipping identifiers already in `ledger`.
    ///
    /// Cancelling `token` stops between identifiers (or abandons the one in
    /// flight, leaving it unmarked); the result set is still finalized.
    pub async fn run(
        &self,
        range: IdRange,
        ledger: &mut ProgressLedger,
        store: &mut ResultStore,
        token: &CancellationToken,
    ) -> Result<RunSummary, HarvestError> {
        let (mut state, _) = update(
            RunState::new(self.settings.run),
            Msg::RestoreHarvested(store.ids()),
        );
        let total = range.len();
        let mut interrupted = false;

        for (index, id) in range.iter().enumerate() {
            if token.is_cancelled() {
                interrupted = true;
                break;
            }

            if ledger.has_completed(&id) {
                self.sink.emit(HarvestEvent::Skipped { id });
                state = self.step(state, Msg::Skipped(id), ledger, store, token).await?;
                continue;
            }

            self.sink.emit(HarvestEvent::Fetching {
                id,
                position: index + 1,
                total,
            });
            let url = self.locator.url_for(&id);
            let report = tokio::select! {
                report = fetch_page(
                    self.fetcher.as_ref(),
                    id,
                    &url,
                    &self.settings.retry,
                    self.settings.encoding,
                    self.sink.as_ref(),
                ) => report,
                _ = token.cancelled() => {
                    interrupted = true;
                    break;
                }
            };

            let result = self.page_result(&state, id, &url, report);
            state = self
                .step(state, Msg::PageProcessed { id, result }, ledger, store, token)
                .await?;
        }

        let last = if interrupted {
            Msg::Interrupted
        } else {
            Msg::RangeFinished
        };
        let state = self.step(state, last, ledger, store, token).await?;

        let summary = state.summary();
        self.sink.emit(HarvestEvent::Finished {
            summary,
            records: store.len(),
            path: store.path().to_path_buf(),
        });
        Ok(summary)
    }

    fn page_result(
        &self,
        state: &RunState,
        id: Identifier,
        url: &str,
        report: FetchReport,
    ) -> PageResult {
        match report.outcome {
            PageOutcome::Fetched(html) => match self.extractor.extract(&html, &id, url) {
                Ok(extraction) => {
                    if state.is_known(&extraction.record.id) {
                        self.sink.emit(HarvestEvent::Duplicate { id });
                    } else {
                        self.sink.emit(HarvestEvent::Extracted {
                            id,
                            strategy: extraction.strategy,
                            body_chars: extraction.record.body.chars().count(),
                        });
                    }
                    PageResult::Extracted(extraction.record)
                }
                Err(failure) => {
                    let reason = failure.to_string();
                    self.sink.emit(HarvestEvent::ExtractionFailed {
                        id,
                        reason: reason.clone(),
                    });
                    PageResult::ExtractionFailed(reason)
                }
            },
            PageOutcome::NotFound => {
                self.sink.emit(HarvestEvent::NotFound { id });
                PageResult::NotFound
            }
            PageOutcome::TransientFailure(cause) => {
                self.sink.emit(HarvestEvent::FetchFailed {
                    id,
                    attempts: report.attempts,
                    cause: cause.clone(),
                });
                PageResult::Failed(cause)
            }
        }
    }

    async fn step(
        &self,
        state: RunState,
        msg: Msg,
        ledger: &mut ProgressLedger,
        store: &mut ResultStore,
        token: &CancellationToken,
    ) -> Result<RunState, HarvestError> {
        let (state, effects) = update(state, msg);
        for effect in effects {
            self.execute(effect, ledger, store, token).await?;
        }
        Ok(state)
    }

    async fn execute(
        &self,
        effect: Effect,
        ledger: &mut ProgressLedger,
        store: &mut ResultStore,
        token: &CancellationToken,
    ) -> Result<(), HarvestError> {
        match effect {
            Effect::Append(record) => {
                store.append(record);
            }
            Effect::MarkCompleted(id) => ledger.mark_completed(&id)?,
            Effect::Checkpoint => {
                let path = store.checkpoint()?;
                self.sink.emit(HarvestEvent::Checkpoint {
                    records: store.len(),
                    path,
                });
            }
            Effect::Finalize => {
                let path = store.finalize()?;
                self.sink.emit(HarvestEvent::Checkpoint {
                    records: store.len(),
                    path,
                });
            }
            Effect::Pause => self.pause(token).await,
        }
        Ok(())
    }

    async fn pause(&self, token: &CancellationToken) {
        if self.settings.delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.settings.delay) => {}
            _ = token.cancelled() => {}
        }
    }
}
