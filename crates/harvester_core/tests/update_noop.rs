use harvester_core::{update, Msg, RunSettings, RunState};

#[test]
fn messages_after_finish_are_noop() {
    let (state, _) = update(RunState::new(RunSettings::default()), Msg::RangeFinished);
    let (next, effects) = update(state.clone(), Msg::RangeFinished);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
