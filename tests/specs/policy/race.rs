//! Race policy specs
//!
//! Verify any-of and any-success, including the empty-input cases.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn any_success_picks_the_only_success() {
    let inputs = vec![Stage::new(), Stage::new(), Stage::completed(42)];
    let winner = policy::any_success_of(&inputs).get_timeout(WAIT).unwrap();
    assert_eq!(winner, 42);
}

#[test]
fn any_success_skips_failures() {
    let inputs: Vec<Stage<i32>> = vec![slow_failure(5, "first"), slow(30, 7)];
    assert_eq!(policy::any_success_of(&inputs).get_timeout(WAIT).unwrap(), 7);
}

#[test]
fn any_success_without_inputs_reports_no_stages() {
    let err = policy::any_success_of::<i32>(&[]).get_timeout(WAIT).unwrap_err();
    assert!(
        matches!(err.stage_error(), Some(StageError::NoStagesProvided)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn any_success_when_all_fail_wraps_a_failure() {
    let inputs: Vec<Stage<i32>> = vec![
        Stage::failed(StageError::msg("a")),
        Stage::failed(StageError::msg("b")),
    ];
    let err = policy::any_success_of(&inputs).exception_now().unwrap();
    assert!(matches!(err, StageError::NoneSucceeded(_)), "got {err:?}");
}

#[test]
fn any_of_adopts_first_terminal_outcome() {
    let inputs: Vec<Stage<i32>> = vec![slow(2_000, 1), slow_failure(10, "fast failure")];
    let err = policy::any_of(&inputs).get_timeout(WAIT).unwrap_err();
    assert_eq!(err.to_string(), "fast failure");
}

#[test]
fn any_of_without_inputs_stays_pending() {
    let raced = policy::any_of::<i32>(&[]);
    assert!(matches!(
        raced.get_timeout(Duration::from_millis(20)),
        Err(AccessError::Timeout(_))
    ));
    assert_eq!(raced.state().unwrap(), State::Running);
}
