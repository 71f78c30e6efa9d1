// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor abstraction and the screened default executor
//!
//! Stages never manage threads themselves; they hand continuations to an
//! [`Executor`]. `Stage`'s default-executor methods use the process-wide
//! [`ambient_executor`]. A [`ScreenedExecutor`] is what a factory stores as
//! "the caller's executor", and every default entry point built on a factory
//! passes it explicitly so work never lands on the ambient pool.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// A unit of work submitted to an executor
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to any executor
pub type SharedExecutor = Arc<dyn Executor>;

/// Anything that can run a submitted unit of work
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Task) {
        (**self).execute(task)
    }
}

/// Runs every task on the submitting thread
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task()
    }
}

/// Starts a fresh named thread for every task
#[derive(Clone, Debug)]
pub struct ThreadPerTaskExecutor {
    name: String,
}

impl ThreadPerTaskExecutor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executor for ThreadPerTaskExecutor {
    fn execute(&self, task: Task) {
        // Keep the task reachable so a failed spawn can still run it
        let slot = Arc::new(Mutex::new(Some(task)));
        let worker_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run_slot(&worker_slot));

        if let Err(e) = spawned {
            tracing::warn!(executor = %self.name, error = %e, "thread spawn failed, running inline");
            run_slot(&slot);
        }
    }
}

fn run_slot(slot: &Mutex<Option<Task>>) {
    let task = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(task) = task {
        task();
    }
}

/// Name given to threads of the ambient executor
pub const AMBIENT_THREAD_NAME: &str = "stage-ambient";

/// The process-wide default executor used by `Stage`'s `*_async` methods
pub fn ambient_executor() -> SharedExecutor {
    static AMBIENT: OnceLock<SharedExecutor> = OnceLock::new();
    Arc::clone(AMBIENT.get_or_init(|| Arc::new(ThreadPerTaskExecutor::new(AMBIENT_THREAD_NAME))))
}

/// Wraps a caller-supplied executor so default async work is routed to it
#[derive(Clone)]
pub struct ScreenedExecutor {
    inner: SharedExecutor,
}

impl ScreenedExecutor {
    /// Screen `executor` for use as a factory's default executor
    pub fn screen(executor: SharedExecutor) -> Arc<Self> {
        Arc::new(Self { inner: executor })
    }

    /// The executor this screen forwards to
    pub fn unscreened(&self) -> &SharedExecutor {
        &self.inner
    }
}

impl Executor for ScreenedExecutor {
    fn execute(&self, task: Task) {
        self.inner.execute(task)
    }
}

impl fmt::Debug for ScreenedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenedExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
