//! Minimal-stage guard specs
//!
//! Verify that restricted views reject direct reads and writes without side
//! effects, and that transformations hand back open stages.

use crate::prelude::*;
use crate::prelude::assert_eq;

type CffuProbe = fn(&Cffu<i32>) -> Option<Unsupported>;

fn guarded_cffu_operations() -> [(&'static str, CffuProbe); 22] {
    [
        ("get", |c| c.get().err().and_then(into_unsupported)),
        ("get_timeout", |c| c.get_timeout(WAIT).err().and_then(into_unsupported)),
        ("join", |c| c.join().err().and_then(into_unsupported)),
        ("join_timeout", |c| c.join_timeout(WAIT).err().and_then(into_unsupported)),
        ("get_now", |c| c.get_now(0).err().and_then(into_unsupported)),
        ("result_now", |c| c.result_now().err().and_then(into_unsupported)),
        ("exception_now", |c| c.exception_now().err().and_then(into_unsupported)),
        ("success_now", |c| c.success_now(0).err()),
        ("state", |c| c.state().err()),
        ("cffu_state", |c| c.cffu_state().err()),
        ("is_done", |c| c.is_done().err()),
        ("is_cancelled", |c| c.is_cancelled().err()),
        ("is_completed_exceptionally", |c| c.is_completed_exceptionally().err()),
        ("number_of_dependents", |c| c.number_of_dependents().err()),
        ("complete", |c| c.complete(1).err()),
        ("complete_outcome", |c| c.complete_outcome(Ok(1)).err()),
        ("complete_exceptionally", |c| {
            c.complete_exceptionally(StageError::msg("x")).err()
        }),
        ("cancel", |c| c.cancel().err()),
        ("obtrude_value", |c| c.obtrude_value(1).err()),
        ("obtrude_exception", |c| c.obtrude_exception(StageError::Cancelled).err()),
        ("or_timeout", |c| c.or_timeout(Duration::from_millis(1)).err()),
        ("complete_on_timeout", |c| {
            c.complete_on_timeout(1, Duration::from_millis(1)).err()
        }),
    ]
}

fn into_unsupported(err: AccessError) -> Option<Unsupported> {
    match err {
        AccessError::Unsupported(u) => Some(u),
        _ => None,
    }
}

#[test]
fn every_guarded_operation_rejects_pending_minimal_cffu() {
    let factory = factory();
    for (name, probe) in guarded_cffu_operations() {
        let underlying: Cffu<i32> = factory.new_incomplete();
        let minimal = underlying.minimal_completion_stage();

        let err = probe(&minimal).unwrap_or_else(|| panic!("{name} was not rejected"));
        assert_minimal_rejection(err);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(underlying.state().unwrap(), State::Running, "{name} changed state");
    }
}

#[test]
fn every_guarded_operation_leaves_completed_value_untouched() {
    let factory = factory();
    for (name, probe) in guarded_cffu_operations() {
        let minimal = factory.completed_minimal(42);

        let err = probe(&minimal).unwrap_or_else(|| panic!("{name} was not rejected"));
        assert_minimal_rejection(err);

        let open = minimal.to_stage();
        assert_eq!(open.result_now().unwrap(), 42, "{name} changed value");
    }
}

#[test]
fn restricted_stage_rejects_reads_and_writes() {
    let underlying: Stage<i32> = Stage::new();
    let minimal = underlying.minimal_completion_stage();

    assert!(minimal.get_now(0).unwrap_err().is_unsupported());
    assert!(minimal.result_now().unwrap_err().is_unsupported());
    assert!(minimal.state().is_err());
    assert!(minimal.is_done().is_err());
    assert!(minimal.complete(1).is_err());
    assert!(minimal.cancel().is_err());
    assert!(minimal.obtrude_value(1).is_err());
    assert!(minimal.or_timeout(Duration::from_millis(1)).is_err());

    assert_eq!(underlying.state().unwrap(), State::Running);
    underlying.complete(3).unwrap();
    assert_eq!(minimal.then_apply(|v| v).get_timeout(WAIT).unwrap(), 3);
}

#[test]
fn minimal_round_trip_ends_restricted_with_open_middle() {
    let stage = Stage::completed(5);
    let middle = stage.minimal_completion_stage().then_apply(|v| v);
    let end = middle.minimal_completion_stage();

    assert!(!middle.is_minimal());
    assert_eq!(middle.result_now().unwrap(), 5);
    assert!(end.is_minimal());
    assert!(end.result_now().unwrap_err().is_unsupported());
}

#[test]
fn cffu_round_trip_ends_restricted_with_open_middle() {
    let factory = factory();
    let middle = factory
        .completed(5)
        .minimal_completion_stage()
        .then_apply(|v| v);
    let end = middle.minimal_completion_stage();

    assert!(!middle.is_minimal());
    assert_eq!(middle.join().unwrap(), 5);
    assert!(end.is_minimal());
    assert_minimal_rejection(into_unsupported(end.join().unwrap_err()).unwrap());
}

#[test]
fn copy_preserves_restriction() {
    let factory = factory();
    let minimal = factory.completed_minimal(1);
    assert!(minimal.copy().is_minimal());
    assert!(!factory.completed(1).copy().is_minimal());
    assert!(Stage::completed_minimal(1).copy().is_minimal());
}

#[test]
fn wrapping_minimal_stage_yields_restricted_cffu() {
    let factory = factory();
    let stage = Stage::completed(9).minimal_completion_stage();
    let wrapped = factory.to_cffu(&stage);

    assert!(wrapped.is_minimal());
    assert_minimal_rejection(wrapped.cancel().unwrap_err());
    assert_eq!(wrapped.to_stage().result_now().unwrap(), 9);
}
