// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Awaiting stages from async code

use crate::error::Outcome;
use crate::stage::Stage;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

/// Future resolving to a stage's outcome.
///
/// Works on restricted stages too: awaiting is a dependent action, not a read.
pub struct StageFuture<T> {
    stage: Stage<T>,
    waker: Option<Arc<Mutex<Option<Waker>>>>,
}

impl<T: Clone + Send + 'static> StageFuture<T> {
    pub(crate) fn new(stage: Stage<T>) -> Self {
        Self { stage, waker: None }
    }
}

impl<T: Clone + Send + 'static> Future for StageFuture<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.stage.outcome_now() {
            return Poll::Ready(outcome);
        }

        match &this.waker {
            Some(slot) => {
                *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(cx.waker().clone());
            }
            None => {
                let slot = Arc::new(Mutex::new(Some(cx.waker().clone())));
                let wake_slot = Arc::clone(&slot);
                this.waker = Some(slot);
                this.stage.on_complete(move |_| {
                    let waker = wake_slot.lock().unwrap_or_else(|e| e.into_inner()).take();
                    if let Some(waker) = waker {
                        waker.wake();
                    }
                });
            }
        }

        // Completion may have raced the waker registration
        match this.stage.outcome_now() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
#[path = "future_tests.rs"]
mod tests;
