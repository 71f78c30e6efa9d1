// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor for deterministic tests
#![cfg_attr(coverage_nightly, coverage(off))]

use cffu_core::{Executor, SharedExecutor, Task};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Queue {
    tasks: VecDeque<Task>,
    submitted: usize,
}

/// Executor that queues tasks until the test runs them
#[derive(Clone, Default)]
pub struct FakeExecutor {
    queue: Arc<Mutex<Queue>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared handle submitting into this fake
    pub fn shared(&self) -> SharedExecutor {
        Arc::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Tasks queued and not yet run
    pub fn pending(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Tasks ever submitted
    pub fn submitted(&self) -> usize {
        self.lock().submitted
    }

    /// Run the oldest queued task; false if the queue was empty
    pub fn run_next(&self) -> bool {
        // Release the lock first: the task may submit more work
        let task = self.lock().tasks.pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run queued tasks, including ones they submit, until none remain
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Executor for FakeExecutor {
    fn execute(&self, task: Task) {
        let mut queue = self.lock();
        queue.submitted += 1;
        queue.tasks.push_back(task);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
