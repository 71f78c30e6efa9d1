// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced executor wrapper for consistent observability

use cffu_core::{Executor, Task};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Wrapper that adds tracing to any Executor
#[derive(Clone)]
pub struct TracedExecutor<E> {
    inner: E,
    name: Arc<str>,
    next_task: Arc<AtomicU64>,
}

impl<E> TracedExecutor<E> {
    pub fn new(name: impl Into<Arc<str>>, inner: E) -> Self {
        Self {
            inner,
            name: name.into(),
            next_task: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Executor> Executor for TracedExecutor<E> {
    fn execute(&self, task: Task) {
        let task_id = self.next_task.fetch_add(1, Ordering::Relaxed);
        let executor = Arc::clone(&self.name);
        tracing::trace!(executor = %executor, task_id, "submitting");

        let submitted = Instant::now();
        self.inner.execute(Box::new(move || {
            let span = tracing::info_span!("executor.task", executor = %executor, task_id);
            let _guard = span.enter();

            tracing::debug!(
                queued_ms = submitted.elapsed().as_millis() as u64,
                "starting"
            );
            let start = Instant::now();
            task();
            tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "finished");
        }));
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
