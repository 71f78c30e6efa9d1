// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion policies over N input stages
//!
//! Every policy returns a new stage completed through the cell's single-winner
//! proposal. Listeners on inputs that lose the race propose anyway; their
//! proposals are no-ops. Positional results always follow input order.
//!
//! | Policy | Completes when | Fails |
//! |---|---|---|
//! | [`all_results_of`] | all inputs done | first failure in input order |
//! | [`all_results_fail_fast_of`] | first failure, or all succeed | on first failure |
//! | [`all_success_results_of`] | all inputs done | never |
//! | [`most_success_results_of`] | timeout, or all inputs done | never |
//! | [`any_of`] | first input done | if that input failed |
//! | [`any_success_of`] | first success, or all fail | if all failed |

use crate::delayer::Delayer;
use crate::error::{Outcome, StageError};
use crate::executor::SharedExecutor;
use crate::stage::Stage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Positional outcomes of the inputs, plus a countdown of inputs not yet recorded
struct Gather<T> {
    slots: Mutex<Vec<Option<Outcome<T>>>>,
    remaining: AtomicUsize,
}

impl<T: Clone + Send + 'static> Gather<T> {
    fn new(len: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(vec![None; len]),
            remaining: AtomicUsize::new(len),
        })
    }

    /// Record input `index`; true when it was the last one outstanding
    fn record(&self, index: usize, outcome: Outcome<T>) -> bool {
        {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots[index] = Some(outcome);
        }
        self.remaining.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Recorded outcomes in input order
    fn take(&self) -> Vec<Outcome<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .iter_mut()
            .map(|slot| {
                slot.take()
                    .unwrap_or_else(|| Err(StageError::msg("input outcome was not recorded")))
            })
            .collect()
    }
}

/// Finishing step run by whichever listener records the last input
struct Once<F>(Mutex<Option<F>>);

impl<F> Once<F> {
    fn new(f: F) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(f))))
    }

    fn take(&self) -> Option<F> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Values in input order, or the first failure in input order
fn collect_in_order<T>(outcomes: Vec<Outcome<T>>) -> Outcome<Vec<T>> {
    outcomes.into_iter().collect()
}

/// Wait for every input, then build the result from the positional outcomes
fn join_all<T, U>(
    policy: &'static str,
    stages: &[Stage<T>],
    finish: impl FnOnce(Vec<Outcome<T>>) -> Outcome<U> + Send + 'static,
) -> Stage<U>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
{
    tracing::debug!(policy, inputs = stages.len(), "combining stages");
    let result = Stage::new();
    let gather = Gather::new(stages.len());
    let finish = Once::new(finish);
    for (index, stage) in stages.iter().enumerate() {
        let gather = Arc::clone(&gather);
        let finish = Arc::clone(&finish);
        let result = result.clone();
        stage.on_complete(move |outcome| {
            if gather.record(index, outcome) {
                if let Some(finish) = finish.take() {
                    result.settle(finish(gather.take()));
                }
            }
        });
    }
    result
}

/// Fail as soon as any input fails; otherwise finish once all succeed
fn join_fail_fast<T, U>(
    policy: &'static str,
    stages: &[Stage<T>],
    finish: impl FnOnce(Vec<T>) -> U + Send + 'static,
) -> Stage<U>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
{
    tracing::debug!(policy, inputs = stages.len(), "combining stages");
    let result = Stage::new();
    let gather = Gather::new(stages.len());
    let finish = Once::new(finish);
    for (index, stage) in stages.iter().enumerate() {
        let gather = Arc::clone(&gather);
        let finish = Arc::clone(&finish);
        let result = result.clone();
        stage.on_complete(move |outcome| match outcome {
            Err(e) => {
                if !result.settle(Err(e)) {
                    tracing::trace!(policy, index, "late input failure ignored");
                }
            }
            Ok(value) => {
                if gather.record(index, Ok(value)) {
                    if let Some(finish) = finish.take() {
                        result.settle(collect_in_order(gather.take()).map(finish));
                    }
                }
            }
        });
    }
    result
}

/// Completes once every input completes; fails with the first failure in input order
pub fn all_results_of<T: Clone + Send + 'static>(stages: &[Stage<T>]) -> Stage<Vec<T>> {
    if stages.is_empty() {
        return Stage::completed(Vec::new());
    }
    join_all("all_results", stages, collect_in_order)
}

/// Void form of [`all_results_of`]
pub fn all_of<T: Clone + Send + 'static>(stages: &[Stage<T>]) -> Stage<()> {
    if stages.is_empty() {
        return Stage::completed(());
    }
    join_all("all", stages, |outcomes| {
        collect_in_order(outcomes).map(|_| ())
    })
}

/// Fails as soon as any input fails, without waiting for the rest
pub fn all_results_fail_fast_of<T: Clone + Send + 'static>(stages: &[Stage<T>]) -> Stage<Vec<T>> {
    if stages.is_empty() {
        return Stage::completed(Vec::new());
    }
    join_fail_fast("all_results_fail_fast", stages, |values| values)
}

/// Void form of [`all_results_fail_fast_of`]
pub fn all_fail_fast_of<T: Clone + Send + 'static>(stages: &[Stage<T>]) -> Stage<()> {
    if stages.is_empty() {
        return Stage::completed(());
    }
    join_fail_fast("all_fail_fast", stages, |_| ())
}

/// Waits for every input; failed inputs contribute `value_if_failed`. Never fails.
pub fn all_success_results_of<T: Clone + Send + 'static>(
    value_if_failed: T,
    stages: &[Stage<T>],
) -> Stage<Vec<T>> {
    if stages.is_empty() {
        return Stage::completed(Vec::new());
    }
    join_all("all_success_results", stages, move |outcomes| {
        Ok(outcomes
            .into_iter()
            .map(|outcome| outcome.unwrap_or_else(|_| value_if_failed.clone()))
            .collect())
    })
}

/// Best-effort results at a deadline.
///
/// Completes when `timeout` elapses or every input completes, whichever comes
/// first. Each position holds the input's value if it had already succeeded at
/// extraction time, else `value_if_not_success`. The timer-triggered extraction
/// runs on `executor_when_timeout`. Never fails.
pub fn most_success_results_of<T: Clone + Send + 'static>(
    executor_when_timeout: &SharedExecutor,
    value_if_not_success: T,
    timeout: Duration,
    stages: &[Stage<T>],
) -> Stage<Vec<T>> {
    if stages.is_empty() {
        return Stage::completed(Vec::new());
    }
    tracing::debug!(
        policy = "most_success_results",
        inputs = stages.len(),
        timeout_ms = timeout.as_millis() as u64,
        "combining stages"
    );
    let result = Stage::new();

    let natural = result.clone();
    let inputs = stages.to_vec();
    let fallback = value_if_not_success.clone();
    all_of(stages).on_complete(move |_| {
        natural.settle(Ok(extract_successes(&inputs, &fallback)));
    });

    let deadline = result.clone();
    let inputs = stages.to_vec();
    let executor = Arc::clone(executor_when_timeout);
    let timer = Delayer::global().schedule(timeout, move || {
        executor.execute(Box::new(move || {
            if deadline.settle(Ok(extract_successes(&inputs, &value_if_not_success))) {
                tracing::debug!(policy = "most_success_results", "deadline reached first");
            }
        }));
    });
    result.on_complete(move |_| timer.cancel());

    result
}

fn extract_successes<T: Clone + Send + 'static>(stages: &[Stage<T>], fallback: &T) -> Vec<T> {
    stages
        .iter()
        .map(|stage| stage.peek_success().unwrap_or_else(|| fallback.clone()))
        .collect()
}

/// Adopts the outcome of the first input to complete.
///
/// With no inputs the result never completes.
pub fn any_of<T: Clone + Send + 'static>(stages: &[Stage<T>]) -> Stage<T> {
    tracing::debug!(policy = "any", inputs = stages.len(), "combining stages");
    let result = Stage::new();
    for stage in stages {
        let result = result.clone();
        stage.on_complete(move |outcome| {
            result.settle(outcome);
        });
    }
    result
}

/// Adopts the first success.
///
/// If every input fails the result fails with [`StageError::NoneSucceeded`]
/// wrapping the first failure in input order; with no inputs it fails with
/// [`StageError::NoStagesProvided`].
pub fn any_success_of<T: Clone + Send + 'static>(stages: &[Stage<T>]) -> Stage<T> {
    if stages.is_empty() {
        return Stage::failed(StageError::NoStagesProvided);
    }
    tracing::debug!(policy = "any_success", inputs = stages.len(), "combining stages");
    let result = Stage::new();
    let failures: Arc<Gather<T>> = Gather::new(stages.len());
    for (index, stage) in stages.iter().enumerate() {
        let failures = Arc::clone(&failures);
        let result = result.clone();
        stage.on_complete(move |outcome| match outcome {
            Ok(value) => {
                result.settle(Ok(value));
            }
            Err(e) => {
                if failures.record(index, Err(e)) {
                    let first = failures
                        .take()
                        .into_iter()
                        .find_map(Result::err)
                        .unwrap_or(StageError::NoStagesProvided);
                    result.settle(Err(StageError::NoneSucceeded(Box::new(first))));
                }
            }
        });
    }
    result
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
