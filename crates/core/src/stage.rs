// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: a single-assignment asynchronous result
//!
//! A `Stage` is pending until exactly one party completes it with a value or a
//! [`StageError`]. Dependent actions registered through the transformation
//! methods run once the outcome is set.
//!
//! A stage handed out through [`Stage::minimal_completion_stage`] is
//! restricted: reading, probing and writing return [`Unsupported`], while every
//! transformation still works and yields an unrestricted stage.

use crate::cell::Cell;
use crate::delayer::Delayer;
use crate::error::{AccessError, Outcome, StageError, Unsupported};
use crate::executor::{ambient_executor, SharedExecutor};
use crate::future::StageFuture;
use crate::policy;
use crate::state::{Extraction, State};
use std::fmt;
use std::future::IntoFuture;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Run a user action, turning a panic into a stage failure
pub(crate) fn run_catching<R>(action: impl FnOnce() -> R) -> Outcome<R> {
    catch_unwind(AssertUnwindSafe(action)).map_err(StageError::from_panic)
}

/// Handle to a single-assignment result cell
///
/// Cloning a stage clones the handle; both clones observe the same outcome.
pub struct Stage<T> {
    cell: Arc<Cell<T>>,
    minimal: bool,
}

impl<T> Clone for Stage<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            minimal: self.minimal,
        }
    }
}

impl<T: Clone + Send + 'static> Default for Stage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("minimal", &self.minimal)
            .field("done", &self.cell.is_done())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Stage<T> {
    fn from_cell(cell: Cell<T>, minimal: bool) -> Self {
        Self {
            cell: Arc::new(cell),
            minimal,
        }
    }

    /// A new pending stage
    pub fn new() -> Self {
        Self::from_cell(Cell::pending(), false)
    }

    pub fn completed(value: T) -> Self {
        Self::from_outcome(Ok(value))
    }

    pub fn failed(error: StageError) -> Self {
        Self::from_outcome(Err(error))
    }

    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self::from_cell(Cell::done(outcome), false)
    }

    /// An already-successful stage that starts out restricted
    pub fn completed_minimal(value: T) -> Self {
        Self::from_cell(Cell::done(Ok(value)), true)
    }

    /// An already-failed stage that starts out restricted
    pub fn failed_minimal(error: StageError) -> Self {
        Self::from_cell(Cell::done(Err(error)), true)
    }

    /// Run `supplier` on the ambient executor
    pub fn supply_async(supplier: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::supply_async_on(&ambient_executor(), supplier)
    }

    pub fn supply_async_on(
        executor: &SharedExecutor,
        supplier: impl FnOnce() -> T + Send + 'static,
    ) -> Self {
        Self::try_supply_async_on(executor, move || Ok(supplier()))
    }

    /// Run a fallible `supplier` on `executor`; its error becomes the stage's failure
    pub fn try_supply_async_on(
        executor: &SharedExecutor,
        supplier: impl FnOnce() -> Outcome<T> + Send + 'static,
    ) -> Self {
        let stage = Self::new();
        let target = stage.clone();
        executor.execute(Box::new(move || {
            target.settle(run_catching(supplier).and_then(|outcome| outcome));
        }));
        stage
    }

    // -- capability ---------------------------------------------------------

    pub fn is_minimal(&self) -> bool {
        self.minimal
    }

    fn check(&self, operation: &'static str) -> Result<(), Unsupported> {
        if self.minimal {
            Err(Unsupported::minimal_stage(operation))
        } else {
            Ok(())
        }
    }

    // -- unguarded internals ------------------------------------------------

    /// Propose an outcome; false if the stage was already complete
    pub(crate) fn settle(&self, outcome: Outcome<T>) -> bool {
        let won = self.cell.try_complete(outcome);
        if !won {
            tracing::trace!("completion attempt lost to an earlier outcome");
        }
        won
    }

    pub(crate) fn outcome_now(&self) -> Option<Outcome<T>> {
        self.cell.peek()
    }

    pub(crate) fn peek_success(&self) -> Option<T> {
        match self.cell.peek() {
            Some(Ok(value)) => Some(value),
            _ => None,
        }
    }

    /// Outcome of a stage known to be complete
    pub(crate) fn settled_outcome(&self) -> Outcome<T> {
        self.cell
            .peek()
            .unwrap_or_else(|| Err(StageError::msg("stage has not completed")))
    }

    pub(crate) fn raw_is_done(&self) -> bool {
        self.cell.is_done()
    }

    pub(crate) fn raw_get_timeout(&self, timeout: Duration) -> Result<T, AccessError> {
        match self.cell.wait_timeout(timeout) {
            None => Err(AccessError::Timeout(timeout)),
            Some(outcome) => Ok(outcome?),
        }
    }

    pub(crate) fn on_complete(&self, action: impl FnOnce(Outcome<T>) + Send + 'static) {
        self.cell.listen(Box::new(action));
    }

    fn on_complete_with(
        &self,
        executor: Option<&SharedExecutor>,
        action: impl FnOnce(Outcome<T>) + Send + 'static,
    ) {
        match executor {
            None => self.on_complete(action),
            Some(executor) => {
                let executor = Arc::clone(executor);
                self.on_complete(move |outcome| {
                    executor.execute(Box::new(move || action(outcome)));
                });
            }
        }
    }

    /// New open stage driven by `action` once this stage completes
    fn derive<U: Clone + Send + 'static>(
        &self,
        executor: Option<&SharedExecutor>,
        action: impl FnOnce(Outcome<T>, &Stage<U>) + Send + 'static,
    ) -> Stage<U> {
        let result = Stage::new();
        let target = result.clone();
        self.on_complete_with(executor, move |outcome| action(outcome, &target));
        result
    }

    // -- guarded reads --------------------------------------------------------

    /// Block until the stage completes
    pub fn get(&self) -> Result<T, AccessError> {
        self.check("get")?;
        Ok(self.cell.wait()?)
    }

    /// Block for at most `timeout`
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, AccessError> {
        self.check("get_timeout")?;
        self.raw_get_timeout(timeout)
    }

    /// The value if complete, `value_if_absent` if still pending
    pub fn get_now(&self, value_if_absent: T) -> Result<T, AccessError> {
        self.check("get_now")?;
        match self.cell.peek() {
            None => Ok(value_if_absent),
            Some(outcome) => Ok(outcome?),
        }
    }

    pub fn is_done(&self) -> Result<bool, Unsupported> {
        self.check("is_done")?;
        Ok(self.cell.is_done())
    }

    pub fn is_cancelled(&self) -> Result<bool, Unsupported> {
        self.check("is_cancelled")?;
        Ok(matches!(self.cell.peek(), Some(Err(StageError::Cancelled))))
    }

    pub fn is_completed_exceptionally(&self) -> Result<bool, Unsupported> {
        self.check("is_completed_exceptionally")?;
        Ok(matches!(self.cell.peek(), Some(Err(_))))
    }

    /// Number of dependent actions still waiting on this stage
    pub fn number_of_dependents(&self) -> Result<usize, Unsupported> {
        self.check("number_of_dependents")?;
        Ok(self.cell.dependents())
    }

    pub fn state(&self) -> Result<State, Unsupported> {
        self.state_with(Extraction::selected())
    }

    pub fn state_with(&self, extraction: Extraction) -> Result<State, Unsupported> {
        self.check("state")?;
        Ok(extraction.state(self))
    }

    /// The value of a successfully completed stage, without blocking
    pub fn result_now(&self) -> Result<T, AccessError> {
        self.result_now_with(Extraction::selected())
    }

    pub fn result_now_with(&self, extraction: Extraction) -> Result<T, AccessError> {
        self.check("result_now")?;
        extraction.result_now(self)
    }

    /// The failure of an exceptionally completed stage, without blocking
    pub fn exception_now(&self) -> Result<StageError, AccessError> {
        self.exception_now_with(Extraction::selected())
    }

    pub fn exception_now_with(&self, extraction: Extraction) -> Result<StageError, AccessError> {
        self.check("exception_now")?;
        extraction.exception_now(self)
    }

    /// The value if the stage already succeeded, otherwise `value_if_not_success`
    pub fn success_now(&self, value_if_not_success: T) -> Result<T, Unsupported> {
        self.success_now_with(Extraction::selected(), value_if_not_success)
    }

    pub fn success_now_with(
        &self,
        extraction: Extraction,
        value_if_not_success: T,
    ) -> Result<T, Unsupported> {
        self.check("success_now")?;
        Ok(extraction.success_now(self, value_if_not_success))
    }

    // -- guarded writes -------------------------------------------------------

    /// Complete with `value` if still pending
    pub fn complete(&self, value: T) -> Result<bool, Unsupported> {
        self.check("complete")?;
        Ok(self.settle(Ok(value)))
    }

    pub fn complete_outcome(&self, outcome: Outcome<T>) -> Result<bool, Unsupported> {
        self.check("complete_outcome")?;
        Ok(self.settle(outcome))
    }

    pub fn complete_exceptionally(&self, error: StageError) -> Result<bool, Unsupported> {
        self.check("complete_exceptionally")?;
        Ok(self.settle(Err(error)))
    }

    /// Complete with [`StageError::Cancelled`] if still pending.
    ///
    /// Stages this one was derived from are not affected.
    pub fn cancel(&self) -> Result<bool, Unsupported> {
        self.check("cancel")?;
        Ok(self.settle(Err(StageError::Cancelled)))
    }

    /// Force the outcome to `value`, even if already complete
    pub fn obtrude_value(&self, value: T) -> Result<(), Unsupported> {
        self.check("obtrude_value")?;
        self.cell.obtrude(Ok(value));
        Ok(())
    }

    pub fn obtrude_exception(&self, error: StageError) -> Result<(), Unsupported> {
        self.check("obtrude_exception")?;
        self.cell.obtrude(Err(error));
        Ok(())
    }

    /// Fail with [`StageError::TimedOut`] if still pending after `timeout`.
    ///
    /// The timeout completion runs on the delayer thread.
    pub fn or_timeout(&self, timeout: Duration) -> Result<Stage<T>, Unsupported> {
        self.check("or_timeout")?;
        Ok(self.arm_timeout(timeout, None, Err(StageError::TimedOut(timeout))))
    }

    /// Like [`Stage::or_timeout`], completing on `executor` instead of the delayer thread
    pub fn or_timeout_on(
        &self,
        executor: &SharedExecutor,
        timeout: Duration,
    ) -> Result<Stage<T>, Unsupported> {
        self.check("or_timeout")?;
        Ok(self.arm_timeout(timeout, Some(executor), Err(StageError::TimedOut(timeout))))
    }

    /// Complete with `value` if still pending after `timeout`
    pub fn complete_on_timeout(&self, value: T, timeout: Duration) -> Result<Stage<T>, Unsupported> {
        self.check("complete_on_timeout")?;
        Ok(self.arm_timeout(timeout, None, Ok(value)))
    }

    pub fn complete_on_timeout_on(
        &self,
        executor: &SharedExecutor,
        value: T,
        timeout: Duration,
    ) -> Result<Stage<T>, Unsupported> {
        self.check("complete_on_timeout")?;
        Ok(self.arm_timeout(timeout, Some(executor), Ok(value)))
    }

    fn arm_timeout(
        &self,
        timeout: Duration,
        executor: Option<&SharedExecutor>,
        outcome: Outcome<T>,
    ) -> Stage<T> {
        if self.cell.is_done() {
            return self.clone();
        }
        let target = self.clone();
        let executor = executor.map(Arc::clone);
        let timer = Delayer::global().schedule(timeout, move || {
            let fire = move || {
                if target.settle(outcome) {
                    tracing::debug!(timeout_ms = timeout.as_millis() as u64, "stage completed by timeout");
                }
            };
            match executor {
                Some(executor) => executor.execute(Box::new(fire)),
                None => fire(),
            }
        });
        self.on_complete(move |_| timer.cancel());
        self.clone()
    }

    // -- views ----------------------------------------------------------------

    /// A restricted view that mirrors this stage's outcome
    pub fn minimal_completion_stage(&self) -> Stage<T> {
        self.mirror(true)
    }

    /// Independent copy that keeps this stage's restriction
    pub fn copy(&self) -> Stage<T> {
        self.mirror(self.minimal)
    }

    /// An unrestricted copy, for handing to code that needs full access
    pub fn to_open_stage(&self) -> Stage<T> {
        self.mirror(false)
    }

    fn mirror(&self, minimal: bool) -> Stage<T> {
        let mirror = Self::from_cell(Cell::pending(), minimal);
        let target = mirror.clone();
        self.on_complete(move |outcome| {
            target.settle(outcome);
        });
        mirror
    }

    /// Await this stage from async code
    pub fn to_future(&self) -> StageFuture<T> {
        StageFuture::new(self.clone())
    }

    // -- transformations ------------------------------------------------------

    /// Map the value once this stage succeeds
    pub fn then_apply<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Stage<U> {
        self.apply_with(None, f)
    }

    pub fn then_apply_async<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Stage<U> {
        self.apply_with(Some(&ambient_executor()), f)
    }

    pub fn then_apply_async_on<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Stage<U> {
        self.apply_with(Some(executor), f)
    }

    fn apply_with<U: Clone + Send + 'static>(
        &self,
        executor: Option<&SharedExecutor>,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Stage<U> {
        self.derive(executor, move |outcome, target| {
            target.settle(outcome.and_then(|value| run_catching(move || f(value))));
        })
    }

    /// Map the value with a fallible function
    pub fn then_try_apply<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> Outcome<U> + Send + 'static,
    ) -> Stage<U> {
        self.derive(None, move |outcome, target| {
            let mapped = outcome.and_then(|value| run_catching(move || f(value)).and_then(|r| r));
            target.settle(mapped);
        })
    }

    /// Chain a stage-producing function; the result follows the produced stage
    pub fn then_compose<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> Stage<U> + Send + 'static,
    ) -> Stage<U> {
        self.compose_with(None, f)
    }

    pub fn then_compose_async_on<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        f: impl FnOnce(T) -> Stage<U> + Send + 'static,
    ) -> Stage<U> {
        self.compose_with(Some(executor), f)
    }

    fn compose_with<U: Clone + Send + 'static>(
        &self,
        executor: Option<&SharedExecutor>,
        f: impl FnOnce(T) -> Stage<U> + Send + 'static,
    ) -> Stage<U> {
        self.derive(executor, move |outcome, target| {
            match outcome.and_then(|value| run_catching(move || f(value))) {
                Ok(next) => follow(&next, target),
                Err(e) => {
                    target.settle(Err(e));
                }
            }
        })
    }

    /// Combine with another stage once both complete
    pub fn then_combine<U, V>(
        &self,
        other: &Stage<U>,
        f: impl FnOnce(T, U) -> V + Send + 'static,
    ) -> Stage<V>
    where
        U: Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let other = other.clone();
        self.derive(None, move |left, target| {
            let target = target.clone();
            other.on_complete(move |right| {
                let combined = match (left, right) {
                    (Ok(l), Ok(r)) => run_catching(move || f(l, r)),
                    (Err(e), _) | (_, Err(e)) => Err(e),
                };
                target.settle(combined);
            });
        })
    }

    /// Apply `f` to whichever of the two stages completes first
    pub fn apply_to_either<V: Clone + Send + 'static>(
        &self,
        other: &Stage<T>,
        f: impl FnOnce(T) -> V + Send + 'static,
    ) -> Stage<V> {
        policy::any_of(&[self.clone(), other.clone()]).then_apply(f)
    }

    /// Map the outcome, success or failure
    pub fn handle<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(Outcome<T>) -> U + Send + 'static,
    ) -> Stage<U> {
        self.handle_with(None, f)
    }

    pub fn handle_async_on<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        f: impl FnOnce(Outcome<T>) -> U + Send + 'static,
    ) -> Stage<U> {
        self.handle_with(Some(executor), f)
    }

    fn handle_with<U: Clone + Send + 'static>(
        &self,
        executor: Option<&SharedExecutor>,
        f: impl FnOnce(Outcome<T>) -> U + Send + 'static,
    ) -> Stage<U> {
        self.derive(executor, move |outcome, target| {
            target.settle(run_catching(move || f(outcome)));
        })
    }

    /// Recover from a failure with a replacement value
    pub fn exceptionally(&self, f: impl FnOnce(StageError) -> T + Send + 'static) -> Stage<T> {
        self.exceptionally_with(None, f)
    }

    pub fn exceptionally_async_on(
        &self,
        executor: &SharedExecutor,
        f: impl FnOnce(StageError) -> T + Send + 'static,
    ) -> Stage<T> {
        self.exceptionally_with(Some(executor), f)
    }

    fn exceptionally_with(
        &self,
        executor: Option<&SharedExecutor>,
        f: impl FnOnce(StageError) -> T + Send + 'static,
    ) -> Stage<T> {
        self.derive(executor, move |outcome, target| {
            let recovered = match outcome {
                Ok(value) => Ok(value),
                Err(e) => run_catching(move || f(e)),
            };
            target.settle(recovered);
        })
    }

    /// Recover from a failure with a replacement stage
    pub fn exceptionally_compose(
        &self,
        f: impl FnOnce(StageError) -> Stage<T> + Send + 'static,
    ) -> Stage<T> {
        self.derive(None, move |outcome, target| match outcome {
            Ok(value) => {
                target.settle(Ok(value));
            }
            Err(e) => match run_catching(move || f(e)) {
                Ok(next) => follow(&next, target),
                Err(panicked) => {
                    target.settle(Err(panicked));
                }
            },
        })
    }

    /// Observe the outcome. A panicking action fails a successful result.
    pub fn when_complete(&self, f: impl FnOnce(&Outcome<T>) + Send + 'static) -> Stage<T> {
        self.derive(None, move |outcome, target| {
            let observed = run_catching(|| f(&outcome));
            match (outcome, observed) {
                (Ok(_), Err(panicked)) => target.settle(Err(panicked)),
                (outcome, _) => target.settle(outcome),
            };
        })
    }

    /// Observe the outcome without creating a new stage; returns this stage.
    ///
    /// A panicking action is logged and otherwise ignored.
    pub fn peek(&self, f: impl FnOnce(&Outcome<T>) + Send + 'static) -> Stage<T> {
        self.peek_with(None, f)
    }

    pub fn peek_async_on(
        &self,
        executor: &SharedExecutor,
        f: impl FnOnce(&Outcome<T>) + Send + 'static,
    ) -> Stage<T> {
        self.peek_with(Some(executor), f)
    }

    fn peek_with(
        &self,
        executor: Option<&SharedExecutor>,
        f: impl FnOnce(&Outcome<T>) + Send + 'static,
    ) -> Stage<T> {
        self.on_complete_with(executor, move |outcome| {
            if let Err(e) = run_catching(|| f(&outcome)) {
                tracing::warn!(error = %e, "peek action failed");
            }
        });
        self.clone()
    }
}

impl Stage<()> {
    /// Run `action` on the ambient executor
    pub fn run_async(action: impl FnOnce() + Send + 'static) -> Self {
        Self::run_async_on(&ambient_executor(), action)
    }

    pub fn run_async_on(executor: &SharedExecutor, action: impl FnOnce() + Send + 'static) -> Self {
        Self::supply_async_on(executor, action)
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Stage<T> {
    type Output = Outcome<T>;
    type IntoFuture = StageFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        StageFuture::new(self)
    }
}

/// Complete `target` with whatever `source` completes with
fn follow<U: Clone + Send + 'static>(source: &Stage<U>, target: &Stage<U>) {
    let target = target.clone();
    source.on_complete(move |outcome| {
        target.settle(outcome);
    });
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
