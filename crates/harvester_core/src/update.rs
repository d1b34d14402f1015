use crate::{Effect, FailurePolicy, Msg, PageResult, RunState};

/// Pure update function: applies a message to the run state and returns the
/// effects the engine must execute, in order.
///
/// Marks for appended records are emitted only after the checkpoint that
/// persists them, so the ledger never claims an identifier whose record could
/// still be lost.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    if state.is_finished() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::RestoreHarvested(keys) => {
            state.restore(keys);
            Vec::new()
        }
        Msg::Skipped(_) => {
            let summary = state.summary_mut();
            summary.processed += 1;
            summary.skipped += 1;
            Vec::new()
        }
        Msg::PageProcessed { id, result } => {
            state.summary_mut().processed += 1;
            let mut effects = match result {
                PageResult::Extracted(record) => {
                    if state.remember(record.id.clone()) {
                        state.summary_mut().fetched += 1;
                        let mut effects = vec![Effect::Append(record)];
                        if state.record_append(id) {
                            effects.extend(checkpoint(&mut state));
                        }
                        effects
                    } else {
                        state.summary_mut().duplicates += 1;
                        vec![Effect::MarkCompleted(id)]
                    }
                }
                PageResult::ExtractionFailed(_) => {
                    state.summary_mut().extraction_failed += 1;
                    vec![Effect::MarkCompleted(id)]
                }
                PageResult::NotFound => {
                    state.summary_mut().not_found += 1;
                    vec![Effect::MarkCompleted(id)]
                }
                PageResult::Failed(_) => {
                    state.summary_mut().errored += 1;
                    match state.settings().failure_policy {
                        FailurePolicy::MarkDone => vec![Effect::MarkCompleted(id)],
                        FailurePolicy::RetryNextRun => Vec::new(),
                    }
                }
            };
            effects.push(Effect::Pause);
            effects
        }
        Msg::RangeFinished => finish(&mut state, false),
        Msg::Interrupted => finish(&mut state, true),
    };

    (state, effects)
}

fn checkpoint(state: &mut RunState) -> Vec<Effect> {
    state.summary_mut().checkpoints += 1;
    let mut effects = vec![Effect::Checkpoint];
    effects.extend(state.take_unmarked().into_iter().map(Effect::MarkCompleted));
    effects
}

fn finish(state: &mut RunState, interrupted: bool) -> Vec<Effect> {
    state.summary_mut().checkpoints += 1;
    let mut effects = vec![Effect::Finalize];
    effects.extend(state.take_unmarked().into_iter().map(Effect::MarkCompleted));
    state.finish(interrupted);
    effects
}
