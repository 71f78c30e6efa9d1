// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::StageError;
use crate::executor::{InlineExecutor, ThreadPerTaskExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};

const WAIT: Duration = Duration::from_secs(5);

fn threads() -> SharedExecutor {
    Arc::new(ThreadPerTaskExecutor::new("multi"))
}

fn inline() -> SharedExecutor {
    Arc::new(InlineExecutor)
}

fn sleepy(millis: u64, value: i32) -> Supplier<i32> {
    Box::new(move || {
        std::thread::sleep(Duration::from_millis(millis));
        value
    })
}

#[test]
fn m_supply_collects_values_in_supplier_order() {
    let result = m_supply_async(&threads(), vec![sleepy(30, 1), sleepy(0, 2), sleepy(10, 3)]);
    assert_eq!(result.get_timeout(WAIT).unwrap(), vec![1, 2, 3]);
}

#[test]
fn m_supply_fail_fast_surfaces_panicking_supplier() {
    let suppliers: Vec<Supplier<i32>> = vec![sleepy(500, 1), Box::new(|| panic!("supplier broke"))];
    let result = m_supply_fail_fast_async(&threads(), suppliers);
    let err = result.get_timeout(WAIT).unwrap_err();
    assert!(matches!(err.stage_error(), Some(StageError::Panicked(_))));
}

#[test]
fn m_supply_all_success_substitutes_failures() {
    let suppliers: Vec<Supplier<i32>> = vec![Box::new(|| 1), Box::new(|| panic!("no"))];
    let result = m_supply_all_success_async(&inline(), 0, suppliers);
    assert_eq!(result.result_now().unwrap(), vec![1, 0]);
}

#[test]
fn m_supply_most_success_cuts_off_slow_suppliers() {
    let result = m_supply_most_success_async(
        &threads(),
        -1,
        Duration::from_millis(50),
        vec![sleepy(0, 1), sleepy(2_000, 2)],
    );
    assert_eq!(result.get_timeout(WAIT).unwrap(), vec![1, -1]);
}

#[test]
fn m_supply_any_success_and_any() {
    let suppliers: Vec<Supplier<i32>> = vec![Box::new(|| panic!("first fails")), Box::new(|| 2)];
    let result = m_supply_any_success_async(&inline(), suppliers);
    assert_eq!(result.result_now().unwrap(), 2);

    let result = m_supply_any_async(&inline(), vec![sleepy(0, 7), sleepy(0, 8)]);
    assert_eq!(result.result_now().unwrap(), 7);
}

#[test]
fn m_run_runs_every_action() {
    let count = Arc::new(AtomicUsize::new(0));
    let actions: Vec<Supplier<()>> = (0..4)
        .map(|_| {
            let count = Arc::clone(&count);
            Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }) as Supplier<()>
        })
        .collect();

    assert!(m_run_async(&threads(), actions).get_timeout(WAIT).is_ok());
    assert_eq!(count.load(Ordering::SeqCst), 4);

    let failing: Vec<Supplier<()>> = vec![Box::new(|| panic!("stop"))];
    assert!(m_run_fail_fast_async(&inline(), failing).result_now().is_err());
}

#[test]
fn then_m_apply_runs_each_mapper_on_the_value() {
    let source = Stage::new();
    let mappers: Vec<Mapper<i32, i32>> = vec![Box::new(|v: i32| v + 1), Box::new(|v: i32| v * 10)];
    let result = source.then_m_apply_async(&threads(), mappers);

    source.complete(4).unwrap();
    assert_eq!(result.get_timeout(WAIT).unwrap(), vec![5, 40]);
}

#[test]
fn then_m_apply_skips_mappers_when_source_fails() {
    let called = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&called);
    let failure = StageError::msg("source failed");
    let source: Stage<i32> = Stage::failed(failure.clone());

    let result = source.then_m_apply_fail_fast_async(
        &inline(),
        vec![Box::new(move |v: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            v
        }) as Mapper<i32, i32>],
    );

    assert!(result.exception_now().unwrap().same_failure(&failure));
    assert_eq!(called.load(Ordering::SeqCst), 0);
}

#[test]
fn then_m_apply_policy_variants() {
    let source = Stage::completed(String::from("abc"));

    let mappers: Vec<Mapper<String, usize>> =
        vec![Box::new(|s: String| s.len()), Box::new(|_: String| panic!("bad mapper"))];
    let all_success = source.then_m_apply_all_success_async(&inline(), 0, mappers);
    assert_eq!(all_success.result_now().unwrap(), vec![3, 0]);

    let mappers: Vec<Mapper<String, usize>> = vec![
        Box::new(|s: String| s.len()),
        Box::new(|_: String| {
            std::thread::sleep(Duration::from_secs(2));
            99
        }),
    ];
    let most = source.then_m_apply_most_success_async(&threads(), 0, Duration::from_millis(50), mappers);
    assert_eq!(most.get_timeout(WAIT).unwrap(), vec![3, 0]);

    let mappers: Vec<Mapper<String, String>> = vec![
        Box::new(|_: String| panic!("no")),
        Box::new(|s: String| s.to_uppercase()),
    ];
    let any_success = source.then_m_apply_any_success_async(&inline(), mappers);
    assert_eq!(any_success.result_now().unwrap(), "ABC");

    let mappers: Vec<Mapper<String, usize>> = vec![Box::new(|s: String| s.len())];
    let any = source.then_m_apply_any_async(&inline(), mappers);
    assert_eq!(any.result_now().unwrap(), 3);
}
