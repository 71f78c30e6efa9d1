//! Join policy specs
//!
//! Verify join-all, fail-fast, all-successes and most-successes-within-deadline
//! behavior over plain stages and `Cffu`s.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn join_all_keeps_input_order_for_any_count() {
    for n in 0..6 {
        let stages: Vec<Stage<usize>> = (0..n).map(|i| slow(((n - i) * 5) as u64, i)).collect();
        let joined = policy::all_results_of(&stages).get_timeout(WAIT).unwrap();
        assert_eq!(joined, (0..n).collect::<Vec<_>>());
    }
}

#[test]
fn join_all_failure_references_input_failure() {
    let failure = StageError::msg("input broke");
    let inputs = vec![Stage::completed(1), Stage::failed(failure.clone()), slow(20, 3)];

    let err = policy::all_results_of(&inputs)
        .get_timeout(WAIT)
        .unwrap_err();
    assert!(err.stage_error().unwrap().same_failure(&failure));
}

#[test]
fn fail_fast_finishes_before_slow_sibling() {
    let start = Instant::now();
    let inputs: Vec<Stage<i32>> = vec![slow(2_000, 1), slow_failure(20, "quick failure")];

    let err = policy::all_results_fail_fast_of(&inputs)
        .get_timeout(WAIT)
        .unwrap_err();

    assert!(err.stage_error().is_some());
    assert!(
        start.elapsed() < Duration::from_millis(1_500),
        "fail-fast waited for the slow input: {:?}",
        start.elapsed()
    );
}

#[test]
fn most_success_substitutes_for_slow_input() {
    let factory = factory();
    let pending = factory.to_cffu(&slow(2_000, 0));
    let fast = factory.completed(42);

    let result = factory
        .most_success_results_of(-1, Duration::from_millis(50), &[pending, fast])
        .join_timeout(WAIT)
        .unwrap();
    assert_eq!(result, vec![-1, 42]);
}

#[test]
fn most_success_with_long_deadline_matches_join_all() {
    let inputs = vec![slow(10, 1), slow(20, 2), Stage::completed(3)];
    let executor = threads("deadline");

    let most = policy::most_success_results_of(&executor, -1, Duration::from_secs(3), &inputs);
    let all = policy::all_results_of(&inputs);

    let start = Instant::now();
    let most = most.get_timeout(WAIT).unwrap();
    assert_eq!(most, all.get_timeout(WAIT).unwrap());
    assert_eq!(most, vec![1, 2, 3]);
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn all_success_substitutes_failures() {
    let inputs = vec![Stage::completed(1), Stage::failed(StageError::Cancelled), slow(10, 3)];
    let result = policy::all_success_results_of(0, &inputs)
        .get_timeout(WAIT)
        .unwrap();
    assert_eq!(result, vec![1, 0, 3]);
}

#[test]
fn late_input_does_not_change_combined_result() {
    let slow_input: Stage<i32> = Stage::new();
    let inputs = vec![Stage::failed(StageError::msg("early")), slow_input.clone()];
    let combined = policy::all_results_fail_fast_of(&inputs);

    let before = combined.exception_now().unwrap();
    slow_input.complete(5).unwrap();

    let after = combined.exception_now().unwrap();
    assert!(before.same_failure(&after));
    assert_eq!(combined.state().unwrap(), State::Failed);
}

#[test]
fn combined_result_ignores_external_second_completion() {
    let factory = factory();
    let combined = factory.all_results_of(&[factory.completed(1), factory.completed(2)]);
    assert_eq!(combined.join().unwrap(), vec![1, 2]);

    assert!(!combined.complete(vec![9]).unwrap());
    assert_eq!(combined.join().unwrap(), vec![1, 2]);
}

#[test]
fn tuple_join_preserves_heterogeneous_types() {
    let factory = factory();
    let tuple = (
        factory.completed(7_u8),
        factory.supply_async(|| "text".to_string()),
        factory.completed(true),
    );
    let joined = factory.all_tuple_of(&tuple).join_timeout(WAIT).unwrap();
    assert_eq!(joined, (7, "text".to_string(), true));
}
