// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-assignment result cell
//!
//! The only shared mutable state of a stage. Completion is a check-then-set
//! under the cell's lock, so concurrent proposals have exactly one winner.

use crate::error::Outcome;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Action run once the cell holds an outcome
pub(crate) type Dependent<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

enum Slot<T> {
    Pending(Vec<Dependent<T>>),
    Done(Outcome<T>),
}

pub(crate) struct Cell<T> {
    slot: Mutex<Slot<T>>,
    done: Condvar,
}

impl<T: Clone + Send + 'static> Cell<T> {
    pub(crate) fn pending() -> Self {
        Self {
            slot: Mutex::new(Slot::Pending(Vec::new())),
            done: Condvar::new(),
        }
    }

    pub(crate) fn done(outcome: Outcome<T>) -> Self {
        Self {
            slot: Mutex::new(Slot::Done(outcome)),
            done: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Propose a terminal outcome. Returns false if another proposal already won.
    pub(crate) fn try_complete(&self, outcome: Outcome<T>) -> bool {
        let dependents = {
            let mut slot = self.lock();
            if matches!(&*slot, Slot::Done(_)) {
                return false;
            }
            match std::mem::replace(&mut *slot, Slot::Done(outcome.clone())) {
                Slot::Pending(dependents) => dependents,
                Slot::Done(_) => Vec::new(),
            }
        };
        self.done.notify_all();
        Self::fire(dependents, outcome);
        true
    }

    /// Overwrite the outcome regardless of state
    pub(crate) fn obtrude(&self, outcome: Outcome<T>) {
        let dependents = {
            let mut slot = self.lock();
            match std::mem::replace(&mut *slot, Slot::Done(outcome.clone())) {
                Slot::Pending(dependents) => dependents,
                Slot::Done(_) => Vec::new(),
            }
        };
        self.done.notify_all();
        Self::fire(dependents, outcome);
    }

    fn fire(dependents: Vec<Dependent<T>>, outcome: Outcome<T>) {
        for dependent in dependents {
            dependent(outcome.clone());
        }
    }

    /// Register a dependent; runs it right away if the cell is already done
    pub(crate) fn listen(&self, dependent: Dependent<T>) {
        let outcome = {
            let mut slot = self.lock();
            match &mut *slot {
                Slot::Pending(dependents) => {
                    dependents.push(dependent);
                    return;
                }
                Slot::Done(outcome) => outcome.clone(),
            }
        };
        dependent(outcome);
    }

    pub(crate) fn peek(&self) -> Option<Outcome<T>> {
        match &*self.lock() {
            Slot::Pending(_) => None,
            Slot::Done(outcome) => Some(outcome.clone()),
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(&*self.lock(), Slot::Done(_))
    }

    pub(crate) fn dependents(&self) -> usize {
        match &*self.lock() {
            Slot::Pending(dependents) => dependents.len(),
            Slot::Done(_) => 0,
        }
    }

    /// Block the calling thread until the cell is done
    pub(crate) fn wait(&self) -> Outcome<T> {
        let mut slot = self.lock();
        loop {
            if let Slot::Done(outcome) = &*slot {
                return outcome.clone();
            }
            slot = self.done.wait(slot).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Block for at most `timeout`; `None` if still pending afterwards
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let slot = self.lock();
        let (slot, _) = self
            .done
            .wait_timeout_while(slot, timeout, |slot| matches!(slot, Slot::Pending(_)))
            .unwrap_or_else(|e| e.into_inner());
        match &*slot {
            Slot::Pending(_) => None,
            Slot::Done(outcome) => Some(outcome.clone()),
        }
    }
}

#[cfg(test)]
#[path = "cell_tests.rs"]
mod tests;
