// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokio runtime bridge

use cffu_core::{Executor, Outcome, Stage, StageError, Task};
use std::future::Future;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinError;

/// Executor running tasks on a tokio runtime's blocking pool
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Executor for the runtime the caller is running in
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Ok(Self::new(Handle::try_current()?))
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Drive `future` on the runtime and expose its output as a stage
    pub fn supply_future<T, F>(&self, future: F) -> Stage<T>
    where
        T: Clone + Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        self.try_supply_future(async move { Ok(future.await) })
    }

    /// Like [`TokioExecutor::supply_future`], with the future's error becoming the stage's failure
    pub fn try_supply_future<T, F>(&self, future: F) -> Stage<T>
    where
        T: Clone + Send + 'static,
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        let stage = Stage::new();
        let target = stage.clone();
        let task = self.handle.spawn(future);
        self.handle.spawn(async move {
            let outcome = task.await.unwrap_or_else(|e| Err(join_failure(e)));
            if let Err(e) = target.complete_outcome(outcome) {
                tracing::warn!(error = %e, "could not complete stage from future");
            }
        });
        stage
    }
}

fn join_failure(error: JoinError) -> StageError {
    if error.is_cancelled() {
        return StageError::Cancelled;
    }
    match error.try_into_panic() {
        Ok(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            StageError::Panicked(message)
        }
        Err(error) => StageError::failed(error),
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: Task) {
        drop(self.handle.spawn_blocking(task));
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
