// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CffuFactory`: creates `Cffu`s bound to a default executor
//!
//! The caller's executor is screened once at construction; every default
//! executor entry point of the factory and its `Cffu`s passes that screened
//! executor explicitly.

use crate::cffu::Cffu;
use crate::config::FactoryConfig;
use crate::tuple::CffuTuple;
use cffu_core::{
    delayed_executor, multi, policy, Extraction, Outcome, ScreenedExecutor, SharedExecutor,
    Stage, StageError, StageTuple, Supplier,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

struct Inner {
    executor: SharedExecutor,
    config: FactoryConfig,
}

/// Shareable factory of [`Cffu`]s
#[derive(Clone)]
pub struct CffuFactory {
    inner: Arc<Inner>,
}

impl fmt::Debug for CffuFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CffuFactory")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CffuFactory`]
pub struct CffuFactoryBuilder {
    executor: SharedExecutor,
    config: FactoryConfig,
}

impl CffuFactoryBuilder {
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn forbid_obtrude(mut self, forbid: bool) -> Self {
        self.config = self.config.with_forbid_obtrude(forbid);
        self
    }

    pub fn extraction(mut self, extraction: Extraction) -> Self {
        self.config = self.config.with_extraction(extraction);
        self
    }

    pub fn build(self) -> CffuFactory {
        let screened: SharedExecutor = ScreenedExecutor::screen(self.executor);
        tracing::debug!(config = ?self.config, "cffu factory built");
        CffuFactory {
            inner: Arc::new(Inner {
                executor: screened,
                config: self.config,
            }),
        }
    }
}

impl CffuFactory {
    pub fn builder(executor: SharedExecutor) -> CffuFactoryBuilder {
        CffuFactoryBuilder {
            executor,
            config: FactoryConfig::default(),
        }
    }

    /// Factory with default configuration
    pub fn new(executor: SharedExecutor) -> Self {
        Self::builder(executor).build()
    }

    /// The screened executor used by every default-executor operation
    pub fn default_executor(&self) -> SharedExecutor {
        Arc::clone(&self.inner.executor)
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    pub fn extraction(&self) -> Extraction {
        self.inner.config.extraction()
    }

    /// Executor that submits to the factory's executor after `delay`
    pub fn delayed_executor(&self, delay: Duration) -> SharedExecutor {
        delayed_executor(delay, self.default_executor())
    }

    fn open<T: Clone + Send + 'static>(&self, stage: Stage<T>) -> Cffu<T> {
        Cffu::new(stage, self.clone(), false)
    }

    fn stages<T: Clone + Send + 'static>(cfs: &[Cffu<T>]) -> Vec<Stage<T>> {
        cfs.iter().map(|cf| cf.stage().clone()).collect()
    }

    // -- constructors ---------------------------------------------------------

    pub fn new_incomplete<T: Clone + Send + 'static>(&self) -> Cffu<T> {
        self.open(Stage::new())
    }

    pub fn completed<T: Clone + Send + 'static>(&self, value: T) -> Cffu<T> {
        self.open(Stage::completed(value))
    }

    pub fn failed<T: Clone + Send + 'static>(&self, error: StageError) -> Cffu<T> {
        self.open(Stage::failed(error))
    }

    pub fn from_outcome<T: Clone + Send + 'static>(&self, outcome: Outcome<T>) -> Cffu<T> {
        self.open(Stage::from_outcome(outcome))
    }

    pub fn completed_minimal<T: Clone + Send + 'static>(&self, value: T) -> Cffu<T> {
        Cffu::new(Stage::completed(value), self.clone(), true)
    }

    pub fn failed_minimal<T: Clone + Send + 'static>(&self, error: StageError) -> Cffu<T> {
        Cffu::new(Stage::failed(error), self.clone(), true)
    }

    pub fn supply_async<T: Clone + Send + 'static>(
        &self,
        supplier: impl FnOnce() -> T + Send + 'static,
    ) -> Cffu<T> {
        self.open(Stage::supply_async_on(&self.inner.executor, supplier))
    }

    pub fn supply_async_on<T: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        supplier: impl FnOnce() -> T + Send + 'static,
    ) -> Cffu<T> {
        self.open(Stage::supply_async_on(executor, supplier))
    }

    pub fn run_async(&self, action: impl FnOnce() + Send + 'static) -> Cffu<()> {
        self.open(Stage::run_async_on(&self.inner.executor, action))
    }

    pub fn run_async_on(
        &self,
        executor: &SharedExecutor,
        action: impl FnOnce() + Send + 'static,
    ) -> Cffu<()> {
        self.open(Stage::run_async_on(executor, action))
    }

    /// Bind a plain stage to this factory.
    ///
    /// A minimal stage yields a minimal `Cffu` over an open copy.
    pub fn to_cffu<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> Cffu<T> {
        if stage.is_minimal() {
            Cffu::new(stage.to_open_stage(), self.clone(), true)
        } else {
            self.open(stage.clone())
        }
    }

    pub fn to_cffu_all<T: Clone + Send + 'static>(&self, stages: &[Stage<T>]) -> Vec<Cffu<T>> {
        stages.iter().map(|stage| self.to_cffu(stage)).collect()
    }

    // -- completion policies --------------------------------------------------

    pub fn all_results_of<T: Clone + Send + 'static>(&self, cfs: &[Cffu<T>]) -> Cffu<Vec<T>> {
        self.open(policy::all_results_of(&Self::stages(cfs)))
    }

    pub fn all_of<T: Clone + Send + 'static>(&self, cfs: &[Cffu<T>]) -> Cffu<()> {
        self.open(policy::all_of(&Self::stages(cfs)))
    }

    pub fn all_results_fail_fast_of<T: Clone + Send + 'static>(
        &self,
        cfs: &[Cffu<T>],
    ) -> Cffu<Vec<T>> {
        self.open(policy::all_results_fail_fast_of(&Self::stages(cfs)))
    }

    pub fn all_fail_fast_of<T: Clone + Send + 'static>(&self, cfs: &[Cffu<T>]) -> Cffu<()> {
        self.open(policy::all_fail_fast_of(&Self::stages(cfs)))
    }

    pub fn all_success_results_of<T: Clone + Send + 'static>(
        &self,
        value_if_failed: T,
        cfs: &[Cffu<T>],
    ) -> Cffu<Vec<T>> {
        self.open(policy::all_success_results_of(
            value_if_failed,
            &Self::stages(cfs),
        ))
    }

    /// Deadline extraction runs on the factory's executor
    pub fn most_success_results_of<T: Clone + Send + 'static>(
        &self,
        value_if_not_success: T,
        timeout: Duration,
        cfs: &[Cffu<T>],
    ) -> Cffu<Vec<T>> {
        self.open(policy::most_success_results_of(
            &self.inner.executor,
            value_if_not_success,
            timeout,
            &Self::stages(cfs),
        ))
    }

    pub fn any_of<T: Clone + Send + 'static>(&self, cfs: &[Cffu<T>]) -> Cffu<T> {
        self.open(policy::any_of(&Self::stages(cfs)))
    }

    pub fn any_success_of<T: Clone + Send + 'static>(&self, cfs: &[Cffu<T>]) -> Cffu<T> {
        self.open(policy::any_success_of(&Self::stages(cfs)))
    }

    // -- tuples ---------------------------------------------------------------

    pub fn all_tuple_of<C: CffuTuple>(
        &self,
        tuple: &C,
    ) -> Cffu<<C::Stages as StageTuple>::Values> {
        self.open(tuple.to_stages().all_of())
    }

    pub fn all_tuple_fail_fast_of<C: CffuTuple>(
        &self,
        tuple: &C,
    ) -> Cffu<<C::Stages as StageTuple>::Values> {
        self.open(tuple.to_stages().all_fail_fast_of())
    }

    pub fn most_success_tuple_of<C: CffuTuple>(
        &self,
        timeout: Duration,
        tuple: &C,
    ) -> Cffu<<C::Stages as StageTuple>::Partial> {
        self.open(
            tuple
                .to_stages()
                .most_success_of(&self.inner.executor, timeout),
        )
    }

    // -- multi-actions --------------------------------------------------------

    pub fn m_supply_async<T: Clone + Send + 'static>(
        &self,
        suppliers: Vec<Supplier<T>>,
    ) -> Cffu<Vec<T>> {
        self.open(multi::m_supply_async(&self.inner.executor, suppliers))
    }

    pub fn m_supply_fail_fast_async<T: Clone + Send + 'static>(
        &self,
        suppliers: Vec<Supplier<T>>,
    ) -> Cffu<Vec<T>> {
        self.open(multi::m_supply_fail_fast_async(
            &self.inner.executor,
            suppliers,
        ))
    }

    pub fn m_supply_all_success_async<T: Clone + Send + 'static>(
        &self,
        value_if_failed: T,
        suppliers: Vec<Supplier<T>>,
    ) -> Cffu<Vec<T>> {
        self.open(multi::m_supply_all_success_async(
            &self.inner.executor,
            value_if_failed,
            suppliers,
        ))
    }

    pub fn m_supply_most_success_async<T: Clone + Send + 'static>(
        &self,
        value_if_not_success: T,
        timeout: Duration,
        suppliers: Vec<Supplier<T>>,
    ) -> Cffu<Vec<T>> {
        self.open(multi::m_supply_most_success_async(
            &self.inner.executor,
            value_if_not_success,
            timeout,
            suppliers,
        ))
    }

    pub fn m_supply_any_success_async<T: Clone + Send + 'static>(
        &self,
        suppliers: Vec<Supplier<T>>,
    ) -> Cffu<T> {
        self.open(multi::m_supply_any_success_async(
            &self.inner.executor,
            suppliers,
        ))
    }

    pub fn m_supply_any_async<T: Clone + Send + 'static>(
        &self,
        suppliers: Vec<Supplier<T>>,
    ) -> Cffu<T> {
        self.open(multi::m_supply_any_async(&self.inner.executor, suppliers))
    }

    pub fn m_run_async(&self, actions: Vec<Supplier<()>>) -> Cffu<()> {
        self.open(multi::m_run_async(&self.inner.executor, actions))
    }

    pub fn m_run_fail_fast_async(&self, actions: Vec<Supplier<()>>) -> Cffu<()> {
        self.open(multi::m_run_fail_fast_async(&self.inner.executor, actions))
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
