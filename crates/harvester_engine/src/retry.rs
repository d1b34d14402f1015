use encoding_rs::Encoding;
use engine_logging::{engine_debug, engine_warn};
use harvester_core::{Identifier, PageOutcome, RetryEvent, RetryPolicy, RetryState};

use crate::decode::decode_forced;
use crate::{FetchError, Fetcher, HarvestEvent, HarvestSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub outcome: PageOutcome,
    pub attempts: u32,
    pub retries: u32,
}

/// Fetch one identifier's page, driving the [`RetryState`] machine.
///
/// A 404 returns [`PageOutcome::NotFound`] on the spot. Retry counts never
/// carry over between identifiers.
pub async fn fetch_page(
    fetcher: &dyn Fetcher,
    id: Identifier,
    url: &str,
    policy: &RetryPolicy,
    encoding: &'static Encoding,
    sink: &dyn HarvestSink,
) -> FetchReport {
    let mut state = policy.start();
    let mut last_error: Option<FetchError> = None;

    loop {
        match state {
            RetryState::Attempting { attempt } => match fetcher.fetch(url).await {
                Ok(output) => {
                    let meta = &output.metadata;
                    engine_debug!(
                        "[{}] HTTP {} - {} bytes ({})",
                        id,
                        meta.status,
                        meta.byte_len,
                        meta.content_type.as_deref().unwrap_or("no content type")
                    );
                    if meta.final_url != meta.url {
                        sink.emit(HarvestEvent::Redirected {
                            id,
                            to: meta.final_url.clone(),
                        });
                    }
                    let decoded = decode_forced(&output.bytes, encoding);
                    if decoded.had_errors {
                        engine_warn!(
                            "[{}] Page is not valid {}; invalid bytes replaced.",
                            id,
                            decoded.encoding_label
                        );
                    }
                    return FetchReport {
                        outcome: PageOutcome::Fetched(decoded.html),
                        attempts: attempt,
                        retries: state.retries(),
                    };
                }
                Err(err) if err.kind.is_not_found() => {
                    return FetchReport {
                        outcome: PageOutcome::NotFound,
                        attempts: attempt,
                        retries: state.retries(),
                    };
                }
                Err(err) => {
                    let retryable = err.kind.is_retryable();
                    state = state.next(RetryEvent::AttemptFailed { retryable }, policy);
                    if let RetryState::Backoff { attempt, delay } = state {
                        sink.emit(HarvestEvent::Retrying {
                            id,
                            attempt,
                            max_attempts: policy.max_attempts(),
                            cause: err.clone(),
                            delay,
                        });
                    }
                    last_error = Some(err);
                }
            },
            RetryState::Backoff { delay, .. } => {
                tokio::time::sleep(delay).await;
                state = state.next(RetryEvent::BackoffElapsed, policy);
            }
            RetryState::Exhausted { attempts } => {
                let cause = last_error
                    .take()
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| "no attempt made".to_string());
                return FetchReport {
                    outcome: PageOutcome::TransientFailure(cause),
                    attempts,
                    retries: state.retries(),
                };
            }
        }
    }
}
