use harvester_core::{
    update, Effect, FailurePolicy, HarvestedRecord, Identifier, Msg, PageResult, RunSettings,
    RunState,
};
use pretty_assertions::assert_eq;

fn id(value: u32) -> Identifier {
    Identifier::new(value, 3)
}

fn extracted(value: u32) -> Msg {
    let id = id(value);
    Msg::PageProcessed {
        id,
        result: PageResult::Extracted(HarvestedRecord::new(id.key(), "t", "long enough body", "")),
    }
}

#[test]
fn checkpoint_follows_every_nth_append_then_marks() {
    let settings = RunSettings {
        checkpoint_every: 2,
        ..RunSettings::default()
    };
    let state = RunState::new(settings);

    let (state, first) = update(state, extracted(1));
    assert!(!first.contains(&Effect::Checkpoint));

    let (state, second) = update(state, extracted(2));
    let tail: Vec<_> = second
        .into_iter()
        .filter(|e| !matches!(e, Effect::Append(_)))
        .collect();
    assert_eq!(
        tail,
        vec![
            Effect::Checkpoint,
            Effect::MarkCompleted(id(1)),
            Effect::MarkCompleted(id(2)),
            Effect::Pause,
        ]
    );
    assert!(state.pending_marks().is_empty());

    let (state, third) = update(state, extracted(3));
    assert!(!third.contains(&Effect::Checkpoint));
    assert_eq!(state.summary().checkpoints, 1);
}

#[test]
fn non_appending_outcomes_do_not_advance_checkpoint_counter() {
    let settings = RunSettings {
        checkpoint_every: 2,
        ..RunSettings::default()
    };
    let state = RunState::new(settings);
    let (state, _) = update(state, extracted(1));
    let (state, _) = update(
        state,
        Msg::PageProcessed {
            id: id(2),
            result: PageResult::NotFound,
        },
    );
    let (_, effects) = update(
        state,
        Msg::PageProcessed {
            id: id(3),
            result: PageResult::Failed("connection reset".into()),
        },
    );
    assert!(!effects.contains(&Effect::Checkpoint));
}

#[test]
fn exhausted_failure_is_marked_under_default_policy() {
    let state = RunState::new(RunSettings::default());
    let (state, effects) = update(
        state,
        Msg::PageProcessed {
            id: id(5),
            result: PageResult::Failed("http status 503".into()),
        },
    );
    assert_eq!(effects, vec![Effect::MarkCompleted(id(5)), Effect::Pause]);
    assert_eq!(state.summary().errored, 1);
}

#[test]
fn exhausted_failure_is_left_unmarked_when_retrying_next_run() {
    let settings = RunSettings {
        failure_policy: FailurePolicy::RetryNextRun,
        ..RunSettings::default()
    };
    let (state, effects) = update(
        RunState::new(settings),
        Msg::PageProcessed {
            id: id(5),
            result: PageResult::Failed("timeout".into()),
        },
    );
    assert_eq!(effects, vec![Effect::Pause]);
    assert_eq!(state.summary().errored, 1);
}

#[test]
fn zero_checkpoint_interval_checkpoints_every_append() {
    let settings = RunSettings {
        checkpoint_every: 0,
        ..RunSettings::default()
    };
    let (_, effects) = update(RunState::new(settings), extracted(1));
    assert!(effects.contains(&Effect::Checkpoint));
}
