// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Cffu`: a stage bound to a factory
//!
//! A `Cffu` carries its own minimal flag and enforces it independently of the
//! underlying [`Stage`], which is always kept open. Default-executor `_async`
//! methods run on the factory's screened executor, never the ambient pool.

use crate::factory::CffuFactory;
use cffu_core::{
    AccessError, Mapper, Outcome, SharedExecutor, Stage, StageError, StageFuture, State,
    Unsupported,
};
use std::fmt;
use std::future::IntoFuture;
use std::time::Duration;

/// Message of every [`Unsupported`] raised by a minimal `Cffu`
pub const MINIMAL_STAGE_MESSAGE: &str = "unsupported because this is a minimal stage";

const OBTRUDE_FORBIDDEN: &str = "obtrude is forbidden by the factory configuration";

/// Stage handle with factory defaults and an independent minimal guard
pub struct Cffu<T> {
    stage: Stage<T>,
    factory: CffuFactory,
    minimal: bool,
}

impl<T> Clone for Cffu<T> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage.clone(),
            factory: self.factory.clone(),
            minimal: self.minimal,
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Cffu<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cffu")
            .field("minimal", &self.minimal)
            .field("stage", &self.stage)
            .finish()
    }
}

impl<T: Clone + Send + 'static> Cffu<T> {
    pub(crate) fn new(stage: Stage<T>, factory: CffuFactory, minimal: bool) -> Self {
        Self {
            stage,
            factory,
            minimal,
        }
    }

    /// An open `Cffu` over `stage` on the same factory
    fn wrap<U: Clone + Send + 'static>(&self, stage: Stage<U>) -> Cffu<U> {
        Cffu::new(stage, self.factory.clone(), false)
    }

    fn executor(&self) -> SharedExecutor {
        self.factory.default_executor()
    }

    fn check(&self, operation: &'static str) -> Result<(), Unsupported> {
        if self.minimal {
            tracing::trace!(operation, "rejected on minimal stage");
            Err(Unsupported::new(operation, MINIMAL_STAGE_MESSAGE))
        } else {
            Ok(())
        }
    }

    fn check_obtrude(&self, operation: &'static str) -> Result<(), Unsupported> {
        self.check(operation)?;
        if self.factory.config().forbid_obtrude {
            return Err(Unsupported::new(operation, OBTRUDE_FORBIDDEN));
        }
        Ok(())
    }

    pub fn is_minimal(&self) -> bool {
        self.minimal
    }

    pub fn factory(&self) -> &CffuFactory {
        &self.factory
    }

    /// The same stage bound to `factory`; the minimal flag is preserved
    pub fn reset_cffu_factory(&self, factory: &CffuFactory) -> Cffu<T> {
        Cffu::new(self.stage.clone(), factory.clone(), self.minimal)
    }

    // -- guarded reads --------------------------------------------------------

    pub fn get(&self) -> Result<T, AccessError> {
        self.check("get")?;
        self.stage.get()
    }

    pub fn get_timeout(&self, timeout: Duration) -> Result<T, AccessError> {
        self.check("get_timeout")?;
        self.stage.get_timeout(timeout)
    }

    /// Block until complete; same outcome as [`Cffu::get`]
    pub fn join(&self) -> Result<T, AccessError> {
        self.check("join")?;
        self.stage.get()
    }

    /// Bounded-wait join
    pub fn join_timeout(&self, timeout: Duration) -> Result<T, AccessError> {
        self.check("join_timeout")?;
        self.stage.get_timeout(timeout)
    }

    pub fn get_now(&self, value_if_absent: T) -> Result<T, AccessError> {
        self.check("get_now")?;
        self.stage.get_now(value_if_absent)
    }

    pub fn result_now(&self) -> Result<T, AccessError> {
        self.check("result_now")?;
        self.stage.result_now_with(self.factory.extraction())
    }

    pub fn exception_now(&self) -> Result<StageError, AccessError> {
        self.check("exception_now")?;
        self.stage.exception_now_with(self.factory.extraction())
    }

    pub fn success_now(&self, value_if_not_success: T) -> Result<T, Unsupported> {
        self.check("success_now")?;
        self.stage
            .success_now_with(self.factory.extraction(), value_if_not_success)
    }

    pub fn state(&self) -> Result<State, Unsupported> {
        self.check("state")?;
        self.stage.state_with(self.factory.extraction())
    }

    /// State read straight from the cell, whatever strategy the factory uses
    pub fn cffu_state(&self) -> Result<State, Unsupported> {
        self.check("cffu_state")?;
        self.stage.state_with(cffu_core::Extraction::Native)
    }

    pub fn is_done(&self) -> Result<bool, Unsupported> {
        self.check("is_done")?;
        self.stage.is_done()
    }

    pub fn is_cancelled(&self) -> Result<bool, Unsupported> {
        self.check("is_cancelled")?;
        self.stage.is_cancelled()
    }

    pub fn is_completed_exceptionally(&self) -> Result<bool, Unsupported> {
        self.check("is_completed_exceptionally")?;
        self.stage.is_completed_exceptionally()
    }

    pub fn number_of_dependents(&self) -> Result<usize, Unsupported> {
        self.check("number_of_dependents")?;
        self.stage.number_of_dependents()
    }

    // -- guarded writes -------------------------------------------------------

    pub fn complete(&self, value: T) -> Result<bool, Unsupported> {
        self.check("complete")?;
        self.stage.complete(value)
    }

    pub fn complete_outcome(&self, outcome: Outcome<T>) -> Result<bool, Unsupported> {
        self.check("complete_outcome")?;
        self.stage.complete_outcome(outcome)
    }

    pub fn complete_exceptionally(&self, error: StageError) -> Result<bool, Unsupported> {
        self.check("complete_exceptionally")?;
        self.stage.complete_exceptionally(error)
    }

    pub fn cancel(&self) -> Result<bool, Unsupported> {
        self.check("cancel")?;
        self.stage.cancel()
    }

    pub fn obtrude_value(&self, value: T) -> Result<(), Unsupported> {
        self.check_obtrude("obtrude_value")?;
        self.stage.obtrude_value(value)
    }

    pub fn obtrude_exception(&self, error: StageError) -> Result<(), Unsupported> {
        self.check_obtrude("obtrude_exception")?;
        self.stage.obtrude_exception(error)
    }

    /// Fail with [`StageError::TimedOut`] if still pending after `timeout`.
    ///
    /// Dependents of the timeout completion run on the factory's executor.
    pub fn or_timeout(&self, timeout: Duration) -> Result<Cffu<T>, Unsupported> {
        self.check("or_timeout")?;
        self.stage.or_timeout_on(&self.executor(), timeout)?;
        Ok(self.clone())
    }

    pub fn complete_on_timeout(&self, value: T, timeout: Duration) -> Result<Cffu<T>, Unsupported> {
        self.check("complete_on_timeout")?;
        self.stage
            .complete_on_timeout_on(&self.executor(), value, timeout)?;
        Ok(self.clone())
    }

    // -- views ----------------------------------------------------------------

    /// A restricted view mirroring this `Cffu`
    pub fn minimal_completion_stage(&self) -> Cffu<T> {
        Cffu::new(self.stage.to_open_stage(), self.factory.clone(), true)
    }

    /// Independent copy that keeps this `Cffu`'s restriction
    pub fn copy(&self) -> Cffu<T> {
        Cffu::new(self.stage.to_open_stage(), self.factory.clone(), self.minimal)
    }

    /// The plain stage, for code that does not know about factories.
    ///
    /// A minimal `Cffu` hands out an open copy so writes cannot reach this one.
    pub fn to_stage(&self) -> Stage<T> {
        if self.minimal {
            self.stage.to_open_stage()
        } else {
            self.stage.clone()
        }
    }

    pub fn to_future(&self) -> StageFuture<T> {
        self.stage.to_future()
    }

    // -- transformations ------------------------------------------------------

    pub fn then_apply<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.then_apply(f))
    }

    /// Map on the factory's executor
    pub fn then_apply_async<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.then_apply_async_on(&self.executor(), f))
    }

    pub fn then_apply_async_on<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.then_apply_async_on(executor, f))
    }

    pub fn then_try_apply<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> Outcome<U> + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.then_try_apply(f))
    }

    pub fn then_compose<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> Cffu<U> + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.then_compose(move |value| f(value).stage))
    }

    pub fn then_compose_async<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(T) -> Cffu<U> + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(
            self.stage
                .then_compose_async_on(&self.executor(), move |value| f(value).stage),
        )
    }

    pub fn then_combine<U, V>(
        &self,
        other: &Cffu<U>,
        f: impl FnOnce(T, U) -> V + Send + 'static,
    ) -> Cffu<V>
    where
        U: Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        self.wrap(self.stage.then_combine(&other.stage, f))
    }

    pub fn apply_to_either<V: Clone + Send + 'static>(
        &self,
        other: &Cffu<T>,
        f: impl FnOnce(T) -> V + Send + 'static,
    ) -> Cffu<V> {
        self.wrap(self.stage.apply_to_either(&other.stage, f))
    }

    pub fn handle<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(Outcome<T>) -> U + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.handle(f))
    }

    pub fn handle_async<U: Clone + Send + 'static>(
        &self,
        f: impl FnOnce(Outcome<T>) -> U + Send + 'static,
    ) -> Cffu<U> {
        self.wrap(self.stage.handle_async_on(&self.executor(), f))
    }

    pub fn exceptionally(&self, f: impl FnOnce(StageError) -> T + Send + 'static) -> Cffu<T> {
        self.wrap(self.stage.exceptionally(f))
    }

    pub fn exceptionally_async(
        &self,
        f: impl FnOnce(StageError) -> T + Send + 'static,
    ) -> Cffu<T> {
        self.wrap(self.stage.exceptionally_async_on(&self.executor(), f))
    }

    pub fn exceptionally_compose(
        &self,
        f: impl FnOnce(StageError) -> Cffu<T> + Send + 'static,
    ) -> Cffu<T> {
        self.wrap(self.stage.exceptionally_compose(move |e| f(e).stage))
    }

    pub fn when_complete(&self, f: impl FnOnce(&Outcome<T>) + Send + 'static) -> Cffu<T> {
        self.wrap(self.stage.when_complete(f))
    }

    /// Observe the outcome; returns this `Cffu`, restriction included
    pub fn peek(&self, f: impl FnOnce(&Outcome<T>) + Send + 'static) -> Cffu<T> {
        self.stage.peek(f);
        self.clone()
    }

    pub fn peek_async(&self, f: impl FnOnce(&Outcome<T>) + Send + 'static) -> Cffu<T> {
        self.stage.peek_async_on(&self.executor(), f);
        self.clone()
    }

    // -- multi-actions on the factory executor --------------------------------

    pub fn then_m_apply_async<U: Clone + Send + 'static>(
        &self,
        mappers: Vec<Mapper<T, U>>,
    ) -> Cffu<Vec<U>> {
        self.wrap(self.stage.then_m_apply_async(&self.executor(), mappers))
    }

    pub fn then_m_apply_fail_fast_async<U: Clone + Send + 'static>(
        &self,
        mappers: Vec<Mapper<T, U>>,
    ) -> Cffu<Vec<U>> {
        self.wrap(
            self.stage
                .then_m_apply_fail_fast_async(&self.executor(), mappers),
        )
    }

    pub fn then_m_apply_all_success_async<U: Clone + Send + 'static>(
        &self,
        value_if_failed: U,
        mappers: Vec<Mapper<T, U>>,
    ) -> Cffu<Vec<U>> {
        self.wrap(self.stage.then_m_apply_all_success_async(
            &self.executor(),
            value_if_failed,
            mappers,
        ))
    }

    pub fn then_m_apply_most_success_async<U: Clone + Send + 'static>(
        &self,
        value_if_not_success: U,
        timeout: Duration,
        mappers: Vec<Mapper<T, U>>,
    ) -> Cffu<Vec<U>> {
        self.wrap(self.stage.then_m_apply_most_success_async(
            &self.executor(),
            value_if_not_success,
            timeout,
            mappers,
        ))
    }

    pub fn then_m_apply_any_success_async<U: Clone + Send + 'static>(
        &self,
        mappers: Vec<Mapper<T, U>>,
    ) -> Cffu<U> {
        self.wrap(
            self.stage
                .then_m_apply_any_success_async(&self.executor(), mappers),
        )
    }

    pub fn then_m_apply_any_async<U: Clone + Send + 'static>(
        &self,
        mappers: Vec<Mapper<T, U>>,
    ) -> Cffu<U> {
        self.wrap(self.stage.then_m_apply_any_async(&self.executor(), mappers))
    }

    pub(crate) fn stage(&self) -> &Stage<T> {
        &self.stage
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Cffu<T> {
    type Output = Outcome<T>;
    type IntoFuture = StageFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.stage.into_future()
    }
}

#[cfg(test)]
#[path = "cffu_tests.rs"]
mod tests;
