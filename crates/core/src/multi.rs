// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-actions: run N suppliers (or N functions of one value) concurrently
//! and combine their stages under one of the completion policies.

use crate::executor::SharedExecutor;
use crate::policy;
use crate::stage::Stage;
use std::sync::Arc;
use std::time::Duration;

/// Boxed value supplier
pub type Supplier<T> = Box<dyn FnOnce() -> T + Send + 'static>;

/// Boxed function of a stage's value
pub type Mapper<T, U> = Box<dyn FnOnce(T) -> U + Send + 'static>;

fn spawn_all<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    suppliers: Vec<Supplier<T>>,
) -> Vec<Stage<T>> {
    tracing::debug!(actions = suppliers.len(), "submitting multi-action");
    suppliers
        .into_iter()
        .map(|supplier| Stage::supply_async_on(executor, supplier))
        .collect()
}

/// Each mapper becomes a supplier over its own clone of `value`
fn bind<T, U>(value: T, mappers: Vec<Mapper<T, U>>) -> Vec<Supplier<U>>
where
    T: Clone + Send + 'static,
    U: 'static,
{
    mappers
        .into_iter()
        .map(|mapper| {
            let value = value.clone();
            Box::new(move || mapper(value)) as Supplier<U>
        })
        .collect()
}

pub fn m_supply_async<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    suppliers: Vec<Supplier<T>>,
) -> Stage<Vec<T>> {
    policy::all_results_of(&spawn_all(executor, suppliers))
}

pub fn m_supply_fail_fast_async<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    suppliers: Vec<Supplier<T>>,
) -> Stage<Vec<T>> {
    policy::all_results_fail_fast_of(&spawn_all(executor, suppliers))
}

pub fn m_supply_all_success_async<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    value_if_failed: T,
    suppliers: Vec<Supplier<T>>,
) -> Stage<Vec<T>> {
    policy::all_success_results_of(value_if_failed, &spawn_all(executor, suppliers))
}

/// Suppliers run on `executor`, which also performs the deadline extraction
pub fn m_supply_most_success_async<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    value_if_not_success: T,
    timeout: Duration,
    suppliers: Vec<Supplier<T>>,
) -> Stage<Vec<T>> {
    let stages = spawn_all(executor, suppliers);
    policy::most_success_results_of(executor, value_if_not_success, timeout, &stages)
}

pub fn m_supply_any_success_async<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    suppliers: Vec<Supplier<T>>,
) -> Stage<T> {
    policy::any_success_of(&spawn_all(executor, suppliers))
}

pub fn m_supply_any_async<T: Clone + Send + 'static>(
    executor: &SharedExecutor,
    suppliers: Vec<Supplier<T>>,
) -> Stage<T> {
    policy::any_of(&spawn_all(executor, suppliers))
}

pub fn m_run_async(executor: &SharedExecutor, actions: Vec<Supplier<()>>) -> Stage<()> {
    policy::all_of(&spawn_all(executor, actions))
}

pub fn m_run_fail_fast_async(executor: &SharedExecutor, actions: Vec<Supplier<()>>) -> Stage<()> {
    policy::all_fail_fast_of(&spawn_all(executor, actions))
}

impl<T: Clone + Send + 'static> Stage<T> {
    /// After this stage succeeds, apply every mapper to its value concurrently
    pub fn then_m_apply_async<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        mappers: Vec<Mapper<T, U>>,
    ) -> Stage<Vec<U>> {
        let executor = Arc::clone(executor);
        self.then_compose(move |value| m_supply_async(&executor, bind(value, mappers)))
    }

    pub fn then_m_apply_fail_fast_async<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        mappers: Vec<Mapper<T, U>>,
    ) -> Stage<Vec<U>> {
        let executor = Arc::clone(executor);
        self.then_compose(move |value| m_supply_fail_fast_async(&executor, bind(value, mappers)))
    }

    pub fn then_m_apply_all_success_async<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        value_if_failed: U,
        mappers: Vec<Mapper<T, U>>,
    ) -> Stage<Vec<U>> {
        let executor = Arc::clone(executor);
        self.then_compose(move |value| {
            m_supply_all_success_async(&executor, value_if_failed, bind(value, mappers))
        })
    }

    /// The deadline starts when this stage succeeds, not when the call is made
    pub fn then_m_apply_most_success_async<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        value_if_not_success: U,
        timeout: Duration,
        mappers: Vec<Mapper<T, U>>,
    ) -> Stage<Vec<U>> {
        let executor = Arc::clone(executor);
        self.then_compose(move |value| {
            m_supply_most_success_async(&executor, value_if_not_success, timeout, bind(value, mappers))
        })
    }

    pub fn then_m_apply_any_success_async<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        mappers: Vec<Mapper<T, U>>,
    ) -> Stage<U> {
        let executor = Arc::clone(executor);
        self.then_compose(move |value| m_supply_any_success_async(&executor, bind(value, mappers)))
    }

    pub fn then_m_apply_any_async<U: Clone + Send + 'static>(
        &self,
        executor: &SharedExecutor,
        mappers: Vec<Mapper<T, U>>,
    ) -> Stage<U> {
        let executor = Arc::clone(executor);
        self.then_compose(move |value| m_supply_any_async(&executor, bind(value, mappers)))
    }
}

#[cfg(test)]
#[path = "multi_tests.rs"]
mod tests;
